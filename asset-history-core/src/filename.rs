//! Filename templates.
//!
//! A template is literal text with `%Field` placeholders. The field name is the maximal run of
//! ASCII alphanumerics after `%` and is matched case-insensitively against [`FIELDS`]. Unknown
//! names expand to nothing, `%%` is a literal `%`, and a `%` with no name after it is kept as is.
//!
//! | Field                  | Alias |
//! |------------------------|-------|
//! | `Id`                   | `vid` |
//! | `AssetId`              | `aid` |
//! | `VersionNumber`        | `v`   |
//! | `ParentAssetVersionId` | `pid` |
//! | `CreatorType`          | `ct`  |
//! | `CreatorTargetId`      | `cid` |
//! | `CreatingUniverseId`   | `uid` |
//! | `Created`              | `t`   |
//! | `Updated`              | `u`   |

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::version::AssetVersion;

pub const SIGIL: char = '%';

/// Appended before the extension when a template would not give each version its own file.
pub const DISAMBIGUATOR: &str = "_v%v";

const TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub struct Field {
    pub names: &'static [&'static str],
    pub value: fn(&AssetVersion) -> String,
}

pub static FIELDS: &[Field] = &[
    Field {
        names: &["id", "vid"],
        value: |v| v.id.to_string(),
    },
    Field {
        names: &["assetid", "aid"],
        value: |v| v.asset_id.to_string(),
    },
    Field {
        names: &["versionnumber", "v"],
        value: |v| v.version_number.to_string(),
    },
    Field {
        names: &["parentassetversionid", "pid"],
        value: |v| v.parent_asset_version_id.to_string(),
    },
    Field {
        names: &["creatortype", "ct"],
        value: |v| v.creator_type.to_string(),
    },
    Field {
        names: &["creatortargetid", "cid"],
        value: |v| v.creator_target_id.to_string(),
    },
    Field {
        names: &["creatinguniverseid", "uid"],
        value: |v| v.creating_universe_id.map(|id| id.to_string()).unwrap_or_default(),
    },
    Field {
        names: &["created", "t"],
        value: |v| format_time(&v.created),
    },
    Field {
        names: &["updated", "u"],
        value: |v| format_time(&v.updated),
    },
];

fn format_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn lookup(name: &str) -> Option<&'static Field> {
    FIELDS
        .iter()
        .find(|f| f.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    /// A placeholder name, without the sigil.
    Field(&'a str),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%(%|[A-Za-z0-9]+)?").expect("placeholder pattern is valid"))
}

/// Splits a template into literal and placeholder tokens.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in placeholder().captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always matches");
        if whole.start() > last {
            tokens.push(Token::Literal(&template[last..whole.start()]));
        }
        match caps.get(1) {
            Some(name) if name.as_str() == "%" => tokens.push(Token::Literal("%")),
            Some(name) => tokens.push(Token::Field(name.as_str())),
            None => tokens.push(Token::Literal("%")),
        }
        last = whole.end();
    }
    if last < template.len() {
        tokens.push(Token::Literal(&template[last..]));
    }
    tokens
}

/// Expands `template` against the fields of `version`.
pub fn expand(template: &str, version: &AssetVersion) -> String {
    tokenize(template)
        .into_iter()
        .map(|token| match token {
            Token::Literal(text) => text.to_string(),
            Token::Field(name) => lookup(name)
                .map(|field| (field.value)(version))
                .unwrap_or_default(),
        })
        .collect()
}

/// How output files are named for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenamePlan {
    /// Git mode: one name, history tells versions apart.
    Fixed(String),
    /// File mode: a template known to give distinct names per version.
    PerVersion(String),
}

impl FilenamePlan {
    /// Git mode plan. The template is expanded once against `first`.
    pub fn fixed(template: &str, first: &AssetVersion) -> Self {
        FilenamePlan::Fixed(expand(template, first))
    }

    /// File mode plan. Rewrites the template with [`DISAMBIGUATOR`] when two probe versions that
    /// differ in id, version number and timestamps would collide.
    pub fn unique(template: &str) -> Self {
        if is_unique(template) {
            tracing::debug!(template, "Filename template is unique");
            return FilenamePlan::PerVersion(template.to_string());
        }
        let rewritten = disambiguate(template);
        tracing::debug!(template, rewritten = %rewritten, "Filename template not unique; rewritten");
        FilenamePlan::PerVersion(rewritten)
    }

    pub fn filename_for(&self, version: &AssetVersion) -> String {
        match self {
            FilenamePlan::Fixed(name) => name.clone(),
            FilenamePlan::PerVersion(template) => expand(template, version),
        }
    }
}

fn probe(n: i64, at: DateTime<Utc>) -> AssetVersion {
    AssetVersion {
        id: n,
        asset_id: 0,
        version_number: n,
        parent_asset_version_id: 0,
        creator_type: 0,
        creator_target_id: 0,
        creating_universe_id: None,
        created: at,
        updated: at,
    }
}

/// True when the template distinguishes versions by id, version number or timestamp.
pub fn is_unique(template: &str) -> bool {
    let now = Utc::now();
    expand(template, &probe(0, now)) != expand(template, &probe(1, now + Duration::days(1)))
}

/// Inserts [`DISAMBIGUATOR`] before the extension of the last path component.
pub fn disambiguate(template: &str) -> String {
    let (stem, ext) = split_extension(template);
    format!("{stem}{DISAMBIGUATOR}{ext}")
}

fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match name[base_start..].rfind('.') {
        Some(dot) => name.split_at(base_start + dot),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn version() -> AssetVersion {
        AssetVersion {
            id: 7,
            asset_id: 3,
            version_number: 12,
            parent_asset_version_id: 6,
            creator_type: 1,
            creator_target_id: 99,
            creating_universe_id: None,
            created: Utc.with_ymd_and_hms(2020, 5, 17, 9, 4, 33).unwrap(),
            updated: Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn expands_fields_and_aliases() {
        let v = version();
        assert_eq!(expand("%id_%aid.rbxl", &v), "7_3.rbxl");
        assert_eq!(expand("%VersionNumber-%v", &v), "12-12");
        assert_eq!(expand("%PID.%ct.%CID", &v), "6.1.99");
        assert_eq!(expand("%t", &v), "2020-05-17-09-04-33");
        assert_eq!(expand("%Updated", &v), "2021-01-02-03-04-05");
    }

    #[test]
    fn sigil_escapes_and_edges() {
        let v = version();
        assert_eq!(expand("100%%done", &v), "100%done");
        assert_eq!(expand("a%zzz-b", &v), "a-b");
        assert_eq!(expand("a%zzzb", &v), "a");
        assert_eq!(expand("trailing%", &v), "trailing%");
        assert_eq!(expand("50%-off", &v), "50%-off");
        assert_eq!(expand("%%%v", &v), "%12");
    }

    #[test]
    fn universe_absent_expands_empty() {
        let mut v = version();
        assert_eq!(expand("[%uid]", &v), "[]");
        v.creating_universe_id = Some(0);
        assert_eq!(expand("[%CreatingUniverseId]", &v), "[0]");
    }

    #[test]
    fn tokenizer_output() {
        assert_eq!(
            tokenize("a%id%%b%"),
            vec![
                Token::Literal("a"),
                Token::Field("id"),
                Token::Literal("%"),
                Token::Literal("b"),
                Token::Literal("%"),
            ]
        );
    }

    #[test]
    fn uniqueness_detection() {
        assert!(!is_unique("asset.rbxl"));
        assert!(!is_unique("%aid.rbxl"));
        assert!(is_unique("%v.rbxl"));
        assert!(is_unique("%vid.rbxl"));
        assert!(is_unique("%t.rbxl"));
    }

    #[test]
    fn disambiguator_goes_before_extension() {
        assert_eq!(disambiguate("asset.rbxl"), "asset_v%v.rbxl");
        assert_eq!(disambiguate("asset"), "asset_v%v");
        assert_eq!(disambiguate("dir.d/place.tar.gz"), "dir.d/place.tar_v%v.gz");
        assert_eq!(disambiguate("dir.d/place"), "dir.d/place_v%v");
    }

    #[test]
    fn rewritten_template_separates_versions() {
        let plan = FilenamePlan::unique("model.rbxm");
        let mut a = version();
        let mut b = version();
        a.version_number = 1;
        b.version_number = 2;
        assert_eq!(plan.filename_for(&a), "model_v1.rbxm");
        assert_eq!(plan.filename_for(&b), "model_v2.rbxm");
    }

    #[test]
    fn fixed_plan_ignores_version() {
        let first = version();
        let plan = FilenamePlan::fixed("%aid.rbxl", &first);
        let mut later = version();
        later.version_number = 40;
        assert_eq!(plan.filename_for(&later), "3.rbxl");
    }
}
