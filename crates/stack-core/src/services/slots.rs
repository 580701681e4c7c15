//! Indexed slot conventions
//!
//! Custom services and frontend apps are declared through numbered keys. This
//! module is the one place those keys are read; the validator reports on the
//! scan results and the detector builds descriptors from the accepted slots.
//!
//! Every slot in the range is probed, so a gap (`CS_1`, `CS_3`) is a hole and
//! never ends the scan.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::catalog;
use crate::config::EffectiveConfig;

pub const CUSTOM_SLOTS: RangeInclusive<u8> = 1..=20;
pub const APP_SLOTS: RangeInclusive<u8> = 1..=10;

pub const CUSTOM_PORT_BASE: u16 = 8000;
pub const APP_PORT_BASE: u16 = 3000;

/// Compact list form for frontend apps, used only when no indexed app exists.
pub const FRONTEND_APPS_KEY: &str = "FRONTEND_APPS";

pub static SERVICE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").unwrap());

pub fn is_valid_service_name(name: &str) -> bool {
    SERVICE_NAME_PATTERN.is_match(name)
}

/// Parse a port value, accepting 1..=65535.
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p != 0)
}

/// Which key convention declared a custom service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotForm {
    /// `CS_<n>=name:template[:port]`
    Compact,
    /// `CUSTOM_SERVICE_<n>_NAME` / `_TEMPLATE` / `_PORT`
    Long,
}

/// Something wrong with a single slot declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotProblem {
    #[error("name is missing")]
    MissingName,

    #[error("template is missing")]
    MissingTemplate,

    #[error("name '{0}' must start with a lowercase letter and contain only a-z, 0-9, '_' or '-'")]
    InvalidName(String),

    #[error("port '{0}' is not a number between 1 and 65535")]
    InvalidPort(String),

    #[error("name '{name}' is already used by slot {first}")]
    DuplicateName { name: String, first: u8 },

    #[error("name '{0}' is already used by a built-in service")]
    BuiltinName(String),

    #[error("name '{name}' is already used by custom service slot {slot}")]
    CustomServiceName { name: String, slot: u8 },
}

/// A custom service as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomServiceDecl {
    pub index: u8,
    pub form: SlotForm,
    pub name: String,
    pub template: String,
    /// Raw port text; `None` means the slot default applies
    pub port: Option<String>,
    pub route: Option<String>,
}

impl CustomServiceDecl {
    /// The key a user would look for when fixing this slot.
    pub fn key(&self) -> String {
        match self.form {
            SlotForm::Compact => format!("CS_{}", self.index),
            SlotForm::Long => format!("CUSTOM_SERVICE_{}_NAME", self.index),
        }
    }

    pub fn route_key(&self) -> String {
        custom_route_key(self.index)
    }

    pub fn default_port(&self) -> u16 {
        CUSTOM_PORT_BASE + u16::from(self.index)
    }
}

pub fn custom_route_key(index: u8) -> String {
    format!("CS_{index}_ROUTE")
}

/// A custom slot together with what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCustom {
    pub decl: CustomServiceDecl,
    pub problems: Vec<SlotProblem>,
    /// Resolved port when the declared one is usable
    pub port: Option<u16>,
}

impl ScannedCustom {
    pub fn is_accepted(&self) -> bool {
        self.problems.is_empty()
    }
}

fn read_custom(cfg: &EffectiveConfig, index: u8) -> Option<CustomServiceDecl> {
    let route = cfg.non_empty(&custom_route_key(index)).map(str::to_string);

    if let Some(compact) = cfg.non_empty(&format!("CS_{index}")) {
        let mut parts = compact.splitn(3, ':').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();
        let template = parts.next().unwrap_or_default().to_string();
        let port = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        return Some(CustomServiceDecl {
            index,
            form: SlotForm::Compact,
            name,
            template,
            port,
            route,
        });
    }

    let long = |field: &str| {
        cfg.non_empty(&format!("CUSTOM_SERVICE_{index}_{field}"))
            .map(str::to_string)
    };
    let (name, template, port) = (long("NAME"), long("TEMPLATE"), long("PORT"));
    if name.is_none() && template.is_none() && port.is_none() {
        return None;
    }
    Some(CustomServiceDecl {
        index,
        form: SlotForm::Long,
        name: name.unwrap_or_default(),
        template: template.unwrap_or_default(),
        port,
        route,
    })
}

/// Scan every custom-service slot.
///
/// Later slots that repeat an earlier name (or a built-in service name) are
/// flagged as duplicates; the earlier slot keeps the name.
pub fn scan_custom_services(cfg: &EffectiveConfig) -> Vec<ScannedCustom> {
    let mut seen: HashMap<String, u8> = HashMap::new();
    let mut scanned = Vec::new();

    for index in CUSTOM_SLOTS {
        let Some(decl) = read_custom(cfg, index) else {
            continue;
        };
        let mut problems = Vec::new();

        if decl.name.is_empty() {
            problems.push(SlotProblem::MissingName);
        } else if !is_valid_service_name(&decl.name) {
            problems.push(SlotProblem::InvalidName(decl.name.clone()));
        } else if catalog::builtin(&decl.name).is_some() {
            problems.push(SlotProblem::BuiltinName(decl.name.clone()));
        } else if let Some(first) = seen.get(&decl.name) {
            problems.push(SlotProblem::DuplicateName {
                name: decl.name.clone(),
                first: *first,
            });
        } else {
            seen.insert(decl.name.clone(), index);
        }

        if decl.template.is_empty() {
            problems.push(SlotProblem::MissingTemplate);
        }

        let port = match &decl.port {
            None => Some(decl.default_port()),
            Some(raw) => {
                let parsed = parse_port(raw);
                if parsed.is_none() {
                    problems.push(SlotProblem::InvalidPort(raw.clone()));
                }
                parsed
            }
        };

        scanned.push(ScannedCustom { decl, problems, port });
    }

    scanned
}

/// A frontend app as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendAppDecl {
    pub index: u8,
    pub name: String,
    pub port: Option<String>,
    pub route: Option<String>,
    pub framework: Option<String>,
    /// Declared through the `FRONTEND_APPS` list rather than indexed keys
    pub from_list: bool,
}

impl FrontendAppDecl {
    pub fn key(&self) -> String {
        if self.from_list {
            FRONTEND_APPS_KEY.to_string()
        } else {
            format!("APP_{}_NAME", self.index)
        }
    }

    pub fn route_key(&self) -> String {
        app_route_key(self.index)
    }

    pub fn default_port(&self) -> u16 {
        APP_PORT_BASE + u16::from(self.index)
    }
}

pub fn app_route_key(index: u8) -> String {
    format!("APP_{index}_ROUTE")
}

/// Short form first, legacy `FRONTEND_APP_<n>_*` second.
fn app_field<'a>(cfg: &'a EffectiveConfig, index: u8, field: &str) -> Option<&'a str> {
    cfg.non_empty(&format!("APP_{index}_{field}"))
        .or_else(|| cfg.non_empty(&format!("FRONTEND_APP_{index}_{field}")))
}

fn read_indexed_apps(cfg: &EffectiveConfig) -> Vec<FrontendAppDecl> {
    APP_SLOTS
        .filter_map(|index| {
            let name = app_field(cfg, index, "NAME")?;
            Some(FrontendAppDecl {
                index,
                name: name.to_string(),
                port: app_field(cfg, index, "PORT").map(str::to_string),
                route: app_field(cfg, index, "ROUTE").map(str::to_string),
                framework: app_field(cfg, index, "FRAMEWORK").map(str::to_string),
                from_list: false,
            })
        })
        .collect()
}

fn app_list_items(cfg: &EffectiveConfig) -> Vec<&str> {
    cfg.non_empty(FRONTEND_APPS_KEY)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn expand_app_list(cfg: &EffectiveConfig) -> Vec<FrontendAppDecl> {
    app_list_items(cfg)
        .into_iter()
        .zip(APP_SLOTS)
        .map(|(item, index)| {
            let (name, framework) = match item.split_once(':') {
                Some((name, framework)) => (name.trim(), Some(framework.trim().to_string())),
                None => (item, None),
            };
            FrontendAppDecl {
                index,
                name: name.to_string(),
                port: None,
                route: cfg.non_empty(&app_route_key(index)).map(str::to_string),
                framework: framework.filter(|f| !f.is_empty()),
                from_list: true,
            }
        })
        .collect()
}

/// `FRONTEND_APPS` items that do not fit in the app slot range.
///
/// Empty when indexed apps exist, since the list is then ignored.
pub fn app_list_overflow(cfg: &EffectiveConfig) -> Vec<String> {
    if !read_indexed_apps(cfg).is_empty() {
        return Vec::new();
    }
    app_list_items(cfg)
        .into_iter()
        .skip(usize::from(*APP_SLOTS.end()))
        .map(str::to_string)
        .collect()
}

/// A frontend app slot together with what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedApp {
    pub decl: FrontendAppDecl,
    pub problems: Vec<SlotProblem>,
    pub port: Option<u16>,
}

impl ScannedApp {
    pub fn is_accepted(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Scan frontend app declarations.
///
/// Indexed slots win; the compact list is expanded only when none exist.
/// App names share one namespace with built-in and accepted custom services.
pub fn scan_frontend_apps(cfg: &EffectiveConfig) -> Vec<ScannedApp> {
    let mut decls = read_indexed_apps(cfg);
    if decls.is_empty() {
        decls = expand_app_list(cfg);
    }

    let custom: HashMap<String, u8> = scan_custom_services(cfg)
        .into_iter()
        .filter(ScannedCustom::is_accepted)
        .map(|s| (s.decl.name, s.decl.index))
        .collect();
    let mut seen: HashMap<String, u8> = HashMap::new();
    decls
        .into_iter()
        .map(|decl| {
            let mut problems = Vec::new();
            if !is_valid_service_name(&decl.name) {
                problems.push(SlotProblem::InvalidName(decl.name.clone()));
            } else if catalog::builtin(&decl.name).is_some() {
                problems.push(SlotProblem::BuiltinName(decl.name.clone()));
            } else if let Some(slot) = custom.get(&decl.name) {
                problems.push(SlotProblem::CustomServiceName {
                    name: decl.name.clone(),
                    slot: *slot,
                });
            } else if let Some(first) = seen.get(&decl.name) {
                problems.push(SlotProblem::DuplicateName {
                    name: decl.name.clone(),
                    first: *first,
                });
            } else {
                seen.insert(decl.name.clone(), decl.index);
            }

            let port = match &decl.port {
                None => Some(decl.default_port()),
                Some(raw) => {
                    let parsed = parse_port(raw);
                    if parsed.is_none() {
                        problems.push(SlotProblem::InvalidPort(raw.clone()));
                    }
                    parsed
                }
            };

            ScannedApp { decl, problems, port }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn cfg(pairs: &[(&str, &str)]) -> EffectiveConfig {
        EffectiveConfig::from_pairs(Environment::Dev, pairs.iter().copied())
    }

    #[rstest]
    #[case("api", true)]
    #[case("my_worker-2", true)]
    #[case("2fast", false)]
    #[case("Api", false)]
    #[case("has space", false)]
    #[case("", false)]
    fn service_name_grammar(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_service_name(name), valid);
    }

    #[rstest]
    #[case("1", Some(1))]
    #[case("65535", Some(65535))]
    #[case(" 8080 ", Some(8080))]
    #[case("0", None)]
    #[case("65536", None)]
    #[case("-1", None)]
    #[case("http", None)]
    fn port_range(#[case] raw: &str, #[case] expected: Option<u16>) {
        assert_eq!(parse_port(raw), expected);
    }

    #[test]
    fn compact_form_with_default_port() {
        let scanned = scan_custom_services(&cfg(&[("CS_3", "worker:bullmq-js")]));
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].decl.index, 3);
        assert_eq!(scanned[0].decl.template, "bullmq-js");
        assert_eq!(scanned[0].port, Some(8003));
        assert!(scanned[0].is_accepted());
    }

    #[test]
    fn long_form_is_read() {
        let scanned = scan_custom_services(&cfg(&[
            ("CUSTOM_SERVICE_2_NAME", "ml"),
            ("CUSTOM_SERVICE_2_TEMPLATE", "fastapi"),
            ("CUSTOM_SERVICE_2_PORT", "8500"),
        ]));
        assert_eq!(scanned[0].decl.form, SlotForm::Long);
        assert_eq!(scanned[0].port, Some(8500));
    }

    #[test]
    fn gaps_do_not_end_the_scan() {
        let scanned = scan_custom_services(&cfg(&[
            ("CS_1", "a:express-js"),
            ("CS_7", "b:fastapi"),
            ("CS_20", "c:go-gin"),
        ]));
        let indices: Vec<u8> = scanned.iter().map(|s| s.decl.index).collect();
        assert_eq!(indices, vec![1, 7, 20]);
    }

    #[test]
    fn duplicate_flags_only_the_later_slot() {
        let scanned = scan_custom_services(&cfg(&[
            ("CS_1", "api-svc:express-js"),
            ("CS_2", "api-svc:fastapi"),
        ]));
        assert!(scanned[0].is_accepted());
        assert_eq!(
            scanned[1].problems,
            vec![SlotProblem::DuplicateName {
                name: "api-svc".into(),
                first: 1
            }]
        );
        assert_eq!(scanned[1].decl.name, "api-svc");
    }

    #[test]
    fn builtin_name_is_rejected() {
        let scanned = scan_custom_services(&cfg(&[("CS_1", "redis:static")]));
        assert_eq!(scanned[0].problems, vec![SlotProblem::BuiltinName("redis".into())]);
    }

    #[test]
    fn missing_parts_and_bad_port_are_all_reported() {
        let scanned = scan_custom_services(&cfg(&[("CS_1", ":")]));
        assert_eq!(
            scanned[0].problems,
            vec![SlotProblem::MissingName, SlotProblem::MissingTemplate]
        );

        let scanned = scan_custom_services(&cfg(&[("CS_1", "svc:static:99999")]));
        assert_eq!(scanned[0].problems, vec![SlotProblem::InvalidPort("99999".into())]);
        assert_eq!(scanned[0].port, None);
    }

    #[test]
    fn route_is_read_for_both_forms() {
        let scanned = scan_custom_services(&cfg(&[("CS_4", "svc:static"), ("CS_4_ROUTE", "docs")]));
        assert_eq!(scanned[0].decl.route.as_deref(), Some("docs"));
        assert_eq!(scanned[0].decl.route_key(), "CS_4_ROUTE");
    }

    #[test]
    fn indexed_apps_with_legacy_keys() {
        let scanned = scan_frontend_apps(&cfg(&[
            ("APP_1_NAME", "web"),
            ("FRONTEND_APP_3_NAME", "shop"),
            ("FRONTEND_APP_3_PORT", "3100"),
            ("FRONTEND_APPS", "ignored"),
        ]));
        let names: Vec<&str> = scanned.iter().map(|s| s.decl.name.as_str()).collect();
        assert_eq!(names, vec!["web", "shop"]);
        assert_eq!(scanned[0].port, Some(3001));
        assert_eq!(scanned[1].port, Some(3100));
    }

    #[test]
    fn app_list_expands_when_no_indexed_apps() {
        let scanned = scan_frontend_apps(&cfg(&[("FRONTEND_APPS", "web:nextjs, docs")]));
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].decl.framework.as_deref(), Some("nextjs"));
        assert_eq!(scanned[0].port, Some(3001));
        assert_eq!(scanned[1].decl.name, "docs");
        assert_eq!(scanned[1].port, Some(3002));
        assert!(scanned[1].decl.from_list);
    }

    #[test]
    fn app_names_share_the_service_namespace() {
        let scanned = scan_frontend_apps(&cfg(&[
            ("CS_1", "web:static"),
            ("APP_1_NAME", "web"),
            ("APP_2_NAME", "postgres"),
            ("APP_3_NAME", "shop"),
        ]));
        assert_eq!(
            scanned[0].problems,
            vec![SlotProblem::CustomServiceName {
                name: "web".into(),
                slot: 1
            }]
        );
        assert_eq!(scanned[1].problems, vec![SlotProblem::BuiltinName("postgres".into())]);
        assert!(scanned[2].is_accepted());
    }

    #[test]
    fn rejected_custom_slot_does_not_claim_its_name() {
        let scanned = scan_frontend_apps(&cfg(&[("CS_1", "web:"), ("APP_1_NAME", "web")]));
        assert!(scanned[0].is_accepted());
    }

    #[test]
    fn app_list_overflow_past_the_last_slot() {
        let list: Vec<String> = (1..=12).map(|i| format!("app{i}")).collect();
        let config = cfg(&[("FRONTEND_APPS", list.join(",").as_str())]);

        assert_eq!(scan_frontend_apps(&config).len(), 10);
        assert_eq!(app_list_overflow(&config), vec!["app11".to_string(), "app12".to_string()]);

        let indexed = cfg(&[("APP_1_NAME", "web"), ("FRONTEND_APPS", list.join(",").as_str())]);
        assert!(app_list_overflow(&indexed).is_empty());
    }
}
