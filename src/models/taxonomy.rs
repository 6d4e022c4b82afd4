//! Subject taxonomy: groups, archives and categories.
//!
//! A category belongs to exactly one archive and an archive belongs to
//! exactly one group. Archives that were merged into others keep their own
//! entry so that old identifiers such as `alg-geom/9202001` still resolve.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::error::{AppError, Result};

/// The group whose monthly listing pages are purged.
pub const PHYSICS_GROUP: &str = "grp_physics";

/// `(archive, group)` pairs.
const ARCHIVES: &[(&str, &str)] = &[
    ("astro-ph", "grp_physics"),
    ("cond-mat", "grp_physics"),
    ("gr-qc", "grp_physics"),
    ("hep-ex", "grp_physics"),
    ("hep-lat", "grp_physics"),
    ("hep-ph", "grp_physics"),
    ("hep-th", "grp_physics"),
    ("math-ph", "grp_physics"),
    ("nlin", "grp_physics"),
    ("nucl-ex", "grp_physics"),
    ("nucl-th", "grp_physics"),
    ("physics", "grp_physics"),
    ("quant-ph", "grp_physics"),
    ("math", "grp_math"),
    ("cs", "grp_cs"),
    ("q-bio", "grp_q-bio"),
    ("q-fin", "grp_q-fin"),
    ("stat", "grp_stat"),
    ("eess", "grp_eess"),
    ("econ", "grp_econ"),
    // Defunct archives, still present in old identifiers.
    ("acc-phys", "grp_physics"),
    ("adap-org", "grp_physics"),
    ("alg-geom", "grp_math"),
    ("ao-sci", "grp_physics"),
    ("atom-ph", "grp_physics"),
    ("bayes-an", "grp_physics"),
    ("chao-dyn", "grp_physics"),
    ("chem-ph", "grp_physics"),
    ("cmp-lg", "grp_cs"),
    ("comp-gas", "grp_physics"),
    ("dg-ga", "grp_math"),
    ("funct-an", "grp_math"),
    ("mtrl-th", "grp_physics"),
    ("patt-sol", "grp_physics"),
    ("plasm-ph", "grp_physics"),
    ("q-alg", "grp_math"),
    ("solv-int", "grp_physics"),
    ("supr-con", "grp_physics"),
];

/// Subject classes per archive. Archives whose only category is the
/// archive itself (e.g. `hep-lat`) have an empty list.
const SUBJECT_CLASSES: &[(&str, &[&str])] = &[
    ("astro-ph", &["CO", "EP", "GA", "HE", "IM", "SR"]),
    (
        "cond-mat",
        &[
            "dis-nn", "mes-hall", "mtrl-sci", "other", "quant-gas", "soft", "stat-mech", "str-el",
            "supr-con",
        ],
    ),
    ("nlin", &["AO", "CD", "CG", "PS", "SI"]),
    (
        "physics",
        &[
            "acc-ph", "ao-ph", "app-ph", "atm-clus", "atom-ph", "bio-ph", "chem-ph", "class-ph",
            "comp-ph", "data-an", "ed-ph", "flu-dyn", "gen-ph", "geo-ph", "hist-ph", "ins-det",
            "med-ph", "optics", "plasm-ph", "pop-ph", "soc-ph", "space-ph",
        ],
    ),
    (
        "math",
        &[
            "AC", "AG", "AP", "AT", "CA", "CO", "CT", "CV", "DG", "DS", "FA", "GM", "GN", "GR",
            "GT", "HO", "IT", "KT", "LO", "MG", "MP", "NA", "NT", "OA", "OC", "PR", "QA", "RA",
            "RT", "SG", "SP", "ST",
        ],
    ),
    (
        "cs",
        &[
            "AI", "AR", "CC", "CE", "CG", "CL", "CR", "CV", "CY", "DB", "DC", "DL", "DM", "DS",
            "ET", "FL", "GL", "GR", "GT", "HC", "IR", "IT", "LG", "LO", "MA", "MM", "MS", "NA",
            "NE", "NI", "OH", "OS", "PF", "PL", "RO", "SC", "SD", "SE", "SI", "SY",
        ],
    ),
    (
        "q-bio",
        &["BM", "CB", "GN", "MN", "NC", "OT", "PE", "QM", "SC", "TO"],
    ),
    (
        "q-fin",
        &["CP", "EC", "GN", "MF", "PM", "PR", "RM", "ST", "TR"],
    ),
    ("stat", &["AP", "CO", "ME", "ML", "OT", "TH"]),
    ("eess", &["AS", "IV", "SP", "SY"]),
    ("econ", &["EM", "GN", "TH"]),
];

/// The global taxonomy, built once from the static tables.
pub static TAXONOMY: LazyLock<Taxonomy> = LazyLock::new(Taxonomy::builtin);

/// Categories, archives and groups a category string resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTaxonomy {
    pub categories: BTreeSet<String>,
    pub archives: BTreeSet<String>,
    /// `None` when the resolver carries no group information.
    pub groups: Option<BTreeSet<String>>,
}

/// Lookup tables for the subject taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    archive_group: HashMap<String, String>,
    category_archive: HashMap<String, String>,
}

impl Taxonomy {
    /// Build the taxonomy from the compiled-in tables.
    pub fn builtin() -> Self {
        let archive_group: HashMap<String, String> = ARCHIVES
            .iter()
            .map(|(archive, group)| (archive.to_string(), group.to_string()))
            .collect();

        // Every archive is also a category of itself; old papers and
        // single-category archives are classified this way.
        let mut category_archive: HashMap<String, String> = ARCHIVES
            .iter()
            .map(|(archive, _)| (archive.to_string(), archive.to_string()))
            .collect();
        for (archive, classes) in SUBJECT_CLASSES {
            for class in *classes {
                category_archive.insert(format!("{archive}.{class}"), archive.to_string());
            }
        }

        Self {
            archive_group,
            category_archive,
        }
    }

    /// Archive owning a category, if the category is known.
    pub fn archive_of(&self, category: &str) -> Option<&str> {
        self.category_archive.get(category).map(String::as_str)
    }

    /// Group owning an archive, if the archive is known.
    pub fn group_of(&self, archive: &str) -> Option<&str> {
        self.archive_group.get(archive).map(String::as_str)
    }

    /// Resolve a whitespace-separated category string.
    ///
    /// Fails on the first token that is neither a category nor an archive.
    pub fn resolve(&self, categories: &str) -> Result<ResolvedTaxonomy> {
        let mut resolved = ResolvedTaxonomy {
            groups: Some(BTreeSet::new()),
            ..ResolvedTaxonomy::default()
        };

        for category in categories.split_whitespace() {
            let archive = self
                .archive_of(category)
                .ok_or_else(|| AppError::unknown_category(category, categories))?;

            if let (Some(groups), Some(group)) = (resolved.groups.as_mut(), self.group_of(archive))
            {
                groups.insert(group.to_string());
            }
            resolved.categories.insert(category.to_string());
            resolved.archives.insert(archive.to_string());
        }

        Ok(resolved)
    }

    /// Archives named by a category string, never failing.
    ///
    /// Unknown tokens contribute the text before their first `.`, so a
    /// category missing from the tables still yields a plausible archive.
    pub fn archives_lenient(&self, categories: &str) -> BTreeSet<String> {
        categories
            .split_whitespace()
            .map(|category| match self.archive_of(category) {
                Some(archive) => archive.to_string(),
                None => category
                    .split_once('.')
                    .map_or(category, |(archive, _)| archive)
                    .to_string(),
            })
            .collect()
    }

    /// Every archive and category id, longest first.
    ///
    /// These are the prefixes an old-style identifier may start with.
    pub fn legacy_prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.category_archive.keys().map(String::as_str).collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        prefixes
    }
}
