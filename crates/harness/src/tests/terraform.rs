use super::helpers::{has_pair, sample_config};
use crate::terraform;

#[test]
fn apply_args_carry_every_variable() {
    let dir = tempfile::tempdir().unwrap();
    let config = sample_config(dir.path());

    let args = terraform::apply_args(&config);

    assert_eq!(args[0], "apply");
    assert!(args.contains(&"-auto-approve".to_string()));
    assert!(args.contains(&"-no-color".to_string()));
    assert!(has_pair(&args, "-var", "cluster_name=e2etest-deployer-ab12cd34"));
    assert!(has_pair(&args, "-var", "gcp_project_id=development-252112"));
    assert!(has_pair(&args, "-var", "location=europe-west4-b"));
    assert!(has_pair(&args, "-var", "machine_type=n1-standard-1"));
    assert!(has_pair(&args, "-var", "node_count=2"));
}

#[test]
fn destroy_args_reuse_the_apply_variables() {
    let dir = tempfile::tempdir().unwrap();
    let config = sample_config(dir.path());

    let args = terraform::destroy_args(&config);

    assert_eq!(args[0], "destroy");
    assert!(args.contains(&"-auto-approve".to_string()));
    assert!(has_pair(&args, "-var", "cluster_name=e2etest-deployer-ab12cd34"));
    assert!(has_pair(&args, "-var", "node_count=2"));
}

#[test]
fn no_color_flag_is_driven_by_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = sample_config(dir.path());
    config.no_color = false;

    assert!(!terraform::init_args(&config).contains(&"-no-color".to_string()));
    assert!(!terraform::apply_args(&config).contains(&"-no-color".to_string()));
    assert!(!terraform::destroy_args(&config).contains(&"-no-color".to_string()));
}

#[test]
fn output_args_request_the_named_output_raw() {
    let args = terraform::output_args("kubeconfig");

    assert_eq!(args, vec!["output", "-raw", "kubeconfig"]);
}
