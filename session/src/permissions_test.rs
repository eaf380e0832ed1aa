use super::*;

const YAML: &str = r#"
roles:
  list: { path: /admin/roles, permission: roles.view }
  create: { path: /admin/roles/create, permission: roles.create }
reports:
  path: /admin/reports
  permission: ""
overview:
  path: /admin/overview
settings:
  nested:
    deeper: { path: /admin/settings, permission: settings.manage }
"#;

fn yaml_map() -> PermissionMap {
    serde_yaml::from_str(YAML).expect("permission map should parse")
}

#[test]
fn nested_tree_is_flattened() {
    let map = yaml_map();
    assert_eq!(map.len(), 5);
    assert_eq!(map.requirement_for("/admin/settings"), Requirement::Permission("settings.manage".into()));
}

#[test]
fn user_lacking_permission_is_denied_and_holder_is_granted() {
    let map = PermissionMap::from_pairs([("/admin/roles", Some("roles.view"))]);
    assert_eq!(
        map.authorize::<&str>("/admin/roles", &[]),
        Access::Denied { requirement: Requirement::Permission("roles.view".into()) }
    );
    assert_eq!(map.authorize("/admin/roles", &["blogs.view"]), map.authorize::<&str>("/admin/roles", &[]));
    assert!(map.authorize("/admin/roles", &["roles.view"]).is_granted());
}

#[test]
fn empty_permission_forbids_everyone() {
    let map = yaml_map();
    assert_eq!(map.requirement_for("/admin/reports"), Requirement::Forbidden);
    assert_eq!(
        map.authorize("/admin/reports", &["", "reports.view"]),
        Access::Denied { requirement: Requirement::Forbidden }
    );
}

#[test]
fn missing_permission_is_unrestricted() {
    let map = yaml_map();
    assert_eq!(map.requirement_for("/admin/overview"), Requirement::Unrestricted);
    assert!(map.authorize::<&str>("/admin/overview", &[]).is_granted());
}

#[test]
fn unmapped_path_is_unrestricted() {
    let map = yaml_map();
    assert!(map.authorize::<&str>("/admin/blogs", &[]).is_granted());
}

#[test]
fn exact_rule_beats_prefix_rule() {
    let map = yaml_map();
    assert!(map.authorize("/admin/roles/create", &["roles.create"]).is_granted());
    assert!(!map.authorize("/admin/roles/create", &["roles.view"]).is_granted());
}

#[test]
fn longest_prefix_applies_to_sub_paths() {
    let map = yaml_map();
    assert_eq!(
        map.requirement_for("/admin/roles/7/edit"),
        Requirement::Permission("roles.view".into())
    );
    assert_eq!(
        map.requirement_for("/admin/roles/create/step-2"),
        Requirement::Permission("roles.create".into())
    );
    assert_eq!(map.requirement_for("/admin/rolesx"), Requirement::Unrestricted);
}

#[test]
fn lookup_ignores_query_and_trailing_slash() {
    let map = yaml_map();
    assert_eq!(map.requirement_for("/admin/reports/?tab=1"), Requirement::Forbidden);
}

#[test]
fn from_pairs_keeps_first_rule_for_duplicate_paths() {
    let map = PermissionMap::from_pairs([("/a", Some("first")), ("/a/", Some("second"))]);
    assert_eq!(map.len(), 1);
    assert_eq!(map.requirement_for("/a"), Requirement::Permission("first".into()));
}

#[test]
fn empty_map_grants_everything() {
    let map = PermissionMap::default();
    assert!(map.is_empty());
    assert!(map.authorize::<&str>("/admin/roles", &[]).is_granted());
}

#[test]
fn unknown_rule_fields_are_rejected_as_groups() {
    let parsed: Result<PermissionMap, _> = serde_yaml::from_str("bad: { path: /x, perm: y }");
    assert!(parsed.is_err());
}
