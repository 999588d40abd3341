// # snsappctl - SNS Platform Application Driver
//
// A thin command-line layer over snsapp-core. It stands in for the
// infrastructure-as-code engine that normally hosts the resource handler:
// it loads the desired configuration, loads the persisted snapshots, and
// calls create / update / read / delete one application at a time.
//
// All resource semantics live in snsapp-core. This binary only decides
// which handler call to make for each configured label.
//
// ## Configuration
//
// - `--config` (default `snsapp.json`): desired applications, see `StackConfig`
// - `--state` (default `snsapp.state.json`): persisted snapshots
// - `SNSAPP_REGION`, `SNSAPP_PROFILE`, `SNSAPP_ENDPOINT_URL`: AWS overrides
// - `SNSAPP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export SNSAPP_REGION=us-east-1
// snsappctl plan
// snsappctl apply
// snsappctl import android arn:aws:sns:us-east-1:123456789012:app/GCM/app1
// ```
//
// ## Exit Codes
//
// - 0: Success
// - 1: Configuration or validation error (nothing was sent)
// - 2: Runtime error (remote call or state store failure)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snsapp_core::traits::StateStore;
use snsapp_core::{
    ApiRegistry, ApplicationConfig, ApplicationHandler, ApplicationState, FileStateStore,
    StackConfig,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    /// Command completed
    Success = 0,
    /// Configuration or validation error
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "snsappctl")]
#[command(about = "Manage SNS platform applications from a JSON configuration", long_about = None)]
struct Cli {
    /// Desired configuration file
    #[arg(short, long, default_value = "snsapp.json")]
    config: PathBuf,

    /// State file holding the last known snapshots
    #[arg(short, long, default_value = "snsapp.state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would do, without calling the service
    Plan,
    /// Create, update or replace applications to match the configuration
    Apply,
    /// Re-read every tracked application from the service
    Refresh,
    /// Adopt an existing application under a label
    Import {
        /// Label to track the application under
        label: String,
        /// Platform application ARN
        #[arg(value_name = "ARN")]
        arn: String,
    },
    /// Delete tracked applications (all of them when no label is given)
    Destroy {
        /// Only destroy this label
        label: Option<String>,
    },
    /// Print the persisted state as JSON
    Show,
}

/// What apply would do for one label
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Create,
    Replace,
    Update(Vec<String>),
    Delete,
    NoOp,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Replace => f.write_str("replace (name or platform changed)"),
            Action::Update(keys) => write!(f, "update {}", keys.join(", ")),
            Action::Delete => f.write_str("delete (no longer configured)"),
            Action::NoOp => f.write_str("no changes"),
        }
    }
}

fn plan_action(config: Option<&ApplicationConfig>, prior: Option<&ApplicationState>) -> Action {
    match (config, prior) {
        (Some(_), None) => Action::Create,
        (None, Some(_)) => Action::Delete,
        (None, None) => Action::NoOp,
        (Some(config), Some(prior)) => {
            if config.requires_replacement(prior) {
                return Action::Replace;
            }
            let mut keys: Vec<String> = ApplicationHandler::changed_attributes(config, prior)
                .into_keys()
                .collect();
            if keys.is_empty() {
                Action::NoOp
            } else {
                keys.sort();
                Action::Update(keys)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match env::var("SNSAPP_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(cli));

    match result {
        Ok(()) => CtlExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Validation and configuration failures happen before any remote call
fn exit_code_for(err: &anyhow::Error) -> CtlExitCode {
    match err.downcast_ref::<snsapp_core::Error>() {
        Some(e) if e.is_validation() || matches!(e, snsapp_core::Error::MalformedIdentifier { .. }) => {
            CtlExitCode::ConfigError
        }
        _ => CtlExitCode::RuntimeError,
    }
}

fn load_config(path: &Path) -> Result<StackConfig> {
    let mut config = StackConfig::load(path)?;
    config.apply_env_overrides();
    config.validate()?;
    info!(
        "Configuration loaded: {} application(s), provider {}",
        config.applications.len(),
        config.provider.type_name()
    );
    Ok(config)
}

async fn open_store(path: &Path) -> Result<FileStateStore> {
    let store = FileStateStore::new(path).await?;
    info!("State file: {}", store.path().display());
    Ok(store)
}

async fn build_handler(config: &StackConfig) -> Result<ApplicationHandler> {
    let registry = ApiRegistry::new();

    #[cfg(feature = "aws")]
    {
        info!("Registering AWS SNS provider");
        snsapp_provider_aws::register(&registry);
    }

    let api = registry.create_api(&config.provider).await?;
    Ok(ApplicationHandler::new(api))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan => {
            let config = load_config(&cli.config)?;
            let store = open_store(&cli.state).await?;
            plan(&config, &store).await
        }
        Commands::Apply => {
            let config = load_config(&cli.config)?;
            let store = open_store(&cli.state).await?;
            let handler = build_handler(&config).await?;
            apply(&config, &handler, &store).await
        }
        Commands::Refresh => {
            let config = load_config(&cli.config)?;
            let store = open_store(&cli.state).await?;
            let handler = build_handler(&config).await?;
            refresh(&handler, &store).await
        }
        Commands::Import { label, arn } => {
            let config = load_config(&cli.config)?;
            let store = open_store(&cli.state).await?;
            if store.get(&label).await?.is_some() {
                anyhow::bail!("Label '{}' is already tracked; destroy or remove it first", label);
            }
            let handler = build_handler(&config).await?;
            let state = handler.import(&arn).await?;
            store.put(&label, &state).await?;
            println!("{}: imported {}", label, state.id);
            Ok(())
        }
        Commands::Destroy { label } => {
            let config = load_config(&cli.config)?;
            let store = open_store(&cli.state).await?;
            let handler = build_handler(&config).await?;
            destroy(label.as_deref(), &handler, &store).await
        }
        Commands::Show => {
            let store = open_store(&cli.state).await?;
            let mut snapshots = serde_json::Map::new();
            for label in store.list().await? {
                if let Some(record) = store.get(&label).await? {
                    snapshots.insert(label, serde_json::to_value(&record)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
            Ok(())
        }
    }
}

/// Every label known to either the configuration or the state, sorted
async fn all_labels(config: &StackConfig, store: &dyn StateStore) -> Result<Vec<String>> {
    let mut labels: Vec<String> = config.applications.keys().cloned().collect();
    for label in store.list().await? {
        if !config.applications.contains_key(&label) {
            labels.push(label);
        }
    }
    labels.sort();
    Ok(labels)
}

async fn plan(config: &StackConfig, store: &dyn StateStore) -> Result<()> {
    for label in all_labels(config, store).await? {
        let prior = store.get(&label).await?.map(|r| r.state);
        let action = plan_action(config.applications.get(&label), prior.as_ref());
        println!("{}: {}", label, action);
    }
    Ok(())
}

async fn apply(
    config: &StackConfig,
    handler: &ApplicationHandler,
    store: &dyn StateStore,
) -> Result<()> {
    for label in all_labels(config, store).await? {
        let desired = config.applications.get(&label);
        let prior = store.get(&label).await?.map(|r| r.state);

        let action = plan_action(desired, prior.as_ref());
        info!("{}: {}", label, action);

        match (action, desired, prior) {
            (Action::NoOp, _, _) => {}
            (Action::Create, Some(desired), _) => {
                let state = create_tracked(&label, desired, handler, store)
                    .await
                    .with_context(|| format!("{}: create failed", label))?;
                println!("{}: created {}", label, state.id);
            }
            (Action::Replace, Some(desired), Some(prior)) => {
                handler
                    .delete(&prior.id)
                    .await
                    .with_context(|| format!("{}: delete before replace failed", label))?;
                store.remove(&label).await?;
                let state = create_tracked(&label, desired, handler, store)
                    .await
                    .with_context(|| format!("{}: create after delete failed", label))?;
                println!("{}: replaced {} with {}", label, prior.id, state.id);
            }
            (Action::Update(_), Some(desired), Some(prior)) => {
                let state = handler
                    .update(desired, &prior)
                    .await
                    .with_context(|| format!("{}: update failed", label))?;
                store.put(&label, &state).await?;
                println!("{}: updated {}", label, state.id);
            }
            (Action::Delete, _, Some(prior)) => {
                handler
                    .delete(&prior.id)
                    .await
                    .with_context(|| format!("{}: delete failed", label))?;
                store.remove(&label).await?;
                println!("{}: deleted {}", label, prior.id);
            }
            (action, _, _) => {
                warn!("{}: inconsistent plan {:?}, skipping", label, action);
            }
        }
    }

    store.flush().await?;
    Ok(())
}

/// Create an application and record it under `label`
///
/// An application that exists remotely is recorded even when the rest of
/// the create failed, so the next apply updates it instead of creating it
/// again.
async fn create_tracked(
    label: &str,
    desired: &ApplicationConfig,
    handler: &ApplicationHandler,
    store: &dyn StateStore,
) -> Result<ApplicationState> {
    match handler.create(desired).await {
        Ok(state) => {
            store.put(label, &state).await?;
            Ok(state)
        }
        Err(e) => {
            if let Some(partial) = e.created_state() {
                warn!("{}: {} was created but is only partly applied", label, partial.id);
                store.put(label, partial).await?;
            }
            Err(e.into())
        }
    }
}

async fn refresh(handler: &ApplicationHandler, store: &dyn StateStore) -> Result<()> {
    for label in store.list().await? {
        let Some(record) = store.get(&label).await? else {
            continue;
        };
        let state = handler
            .refresh(record.state)
            .await
            .with_context(|| format!("{}: refresh failed", label))?;
        store.put(&label, &state).await?;
        println!("{}: refreshed {}", label, state.id);
    }
    store.flush().await?;
    Ok(())
}

async fn destroy(
    only: Option<&str>,
    handler: &ApplicationHandler,
    store: &dyn StateStore,
) -> Result<()> {
    let labels = match only {
        Some(label) => vec![label.to_string()],
        None => store.list().await?,
    };

    for label in labels {
        let Some(record) = store.get(&label).await? else {
            warn!("{}: not tracked, nothing to destroy", label);
            continue;
        };
        handler
            .delete(&record.state.id)
            .await
            .with_context(|| format!("{}: delete failed", label))?;
        store.remove(&label).await?;
        println!("{}: deleted {}", label, record.state.id);
    }

    store.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::CommandFactory;
    use snsapp_core::traits::{AttributeMap, PlatformApi};
    use snsapp_core::{ApiError, MemoryStateStore};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Create(String),
        GetAttributes(String),
        SetAttributes(String),
        Delete(String),
    }

    #[derive(Default)]
    struct Recorded {
        apps: BTreeMap<String, AttributeMap>,
        calls: Vec<Call>,
        fail_set_attributes: bool,
    }

    /// Platform API double that mints `app/PLATFORM/NAME` identifiers and
    /// records every call
    #[derive(Clone, Default)]
    struct RecordingApi(Arc<Mutex<Recorded>>);

    impl RecordingApi {
        fn calls(&self) -> Vec<Call> {
            self.0.lock().unwrap().calls.clone()
        }

        fn clear_calls(&self) {
            self.0.lock().unwrap().calls.clear();
        }

        fn exists(&self, arn: &str) -> bool {
            self.0.lock().unwrap().apps.contains_key(arn)
        }

        fn fail_set_attributes(&self, fail: bool) {
            self.0.lock().unwrap().fail_set_attributes = fail;
        }
    }

    fn not_found() -> ApiError {
        ApiError::with_code("NotFound", "PlatformApplication does not exist")
    }

    #[async_trait]
    impl PlatformApi for RecordingApi {
        async fn create_platform_application(
            &self,
            name: &str,
            platform: &str,
            attributes: AttributeMap,
        ) -> std::result::Result<String, ApiError> {
            let arn = format!("arn:aws:sns:us-east-1:123456789012:app/{platform}/{name}");
            let mut inner = self.0.lock().unwrap();
            inner.calls.push(Call::Create(arn.clone()));
            inner.apps.insert(arn.clone(), attributes);
            Ok(arn)
        }

        async fn get_platform_application_attributes(
            &self,
            arn: &str,
        ) -> std::result::Result<AttributeMap, ApiError> {
            let mut inner = self.0.lock().unwrap();
            inner.calls.push(Call::GetAttributes(arn.to_string()));
            let stored = inner.apps.get(arn).ok_or_else(not_found)?;
            Ok(stored
                .iter()
                .filter(|(key, _)| !key.starts_with("Platform"))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect())
        }

        async fn set_platform_application_attributes(
            &self,
            arn: &str,
            attributes: AttributeMap,
        ) -> std::result::Result<(), ApiError> {
            let mut inner = self.0.lock().unwrap();
            inner.calls.push(Call::SetAttributes(arn.to_string()));
            if inner.fail_set_attributes {
                return Err(ApiError::with_code("Throttled", "Rate exceeded"));
            }
            inner.apps.get_mut(arn).ok_or_else(not_found)?.extend(attributes);
            Ok(())
        }

        async fn delete_platform_application(
            &self,
            arn: &str,
        ) -> std::result::Result<(), ApiError> {
            let mut inner = self.0.lock().unwrap();
            inner.calls.push(Call::Delete(arn.to_string()));
            inner.apps.remove(arn).map(|_| ()).ok_or_else(not_found)
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn fixture() -> (ApplicationHandler, RecordingApi, MemoryStateStore) {
        let api = RecordingApi::default();
        let handler = ApplicationHandler::new(Box::new(api.clone()));
        (handler, api, MemoryStateStore::new())
    }

    fn stack(apps: &[(&str, ApplicationConfig)]) -> StackConfig {
        let mut config = StackConfig::new();
        for (label, app) in apps {
            config.applications.insert(label.to_string(), app.clone());
        }
        config
    }

    fn arn(platform: &str, name: &str) -> String {
        format!("arn:aws:sns:us-east-1:123456789012:app/{platform}/{name}")
    }

    async fn tracked_id(store: &MemoryStateStore, label: &str) -> Option<String> {
        store.get(label).await.unwrap().map(|record| record.state.id)
    }

    fn prior_for(config: &ApplicationConfig) -> ApplicationState {
        let id = format!(
            "arn:aws:sns:us-east-1:123456789012:app/{}/{}",
            config.platform, config.name
        );
        let mut state = ApplicationState::from_id(id.clone()).with_secrets_from(config);
        state.arn = id;
        state.name = config.name.clone();
        state.platform = config.platform.clone();
        state.attributes = config.attributes.clone();
        state
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_actions() {
        let config = ApplicationConfig::new("app1", "GCM", "cred")
            .with_attribute("success_feedback_sample_rate", "50");
        let prior = prior_for(&config);

        assert_eq!(plan_action(Some(&config), None), Action::Create);
        assert_eq!(plan_action(None, Some(&prior)), Action::Delete);
        assert_eq!(plan_action(Some(&config), Some(&prior)), Action::NoOp);

        let changed = config.clone().with_attribute("success_feedback_sample_rate", "100");
        assert_eq!(
            plan_action(Some(&changed), Some(&prior)),
            Action::Update(vec!["SuccessFeedbackSampleRate".to_string()])
        );

        let renamed = ApplicationConfig::new("app2", "GCM", "cred");
        assert_eq!(plan_action(Some(&renamed), Some(&prior)), Action::Replace);
    }

    #[test]
    fn test_validation_errors_map_to_config_exit_code() {
        let err = anyhow::Error::from(snsapp_core::Error::missing_principal("APNS"));
        assert!(matches!(exit_code_for(&err), CtlExitCode::ConfigError));

        let err = anyhow::Error::from(snsapp_core::Error::Delete(
            snsapp_core::ApiError::new("NotFound"),
        ));
        assert!(matches!(exit_code_for(&err), CtlExitCode::RuntimeError));
    }

    #[tokio::test]
    async fn test_apply_creates_then_settles() {
        let (handler, api, store) = fixture();
        let config = stack(&[("android", ApplicationConfig::new("app1", "GCM", "cred"))]);

        apply(&config, &handler, &store).await.unwrap();
        assert_eq!(tracked_id(&store, "android").await, Some(arn("GCM", "app1")));

        api.clear_calls();
        apply(&config, &handler, &store).await.unwrap();
        assert!(api.calls().is_empty(), "second apply: {:?}", api.calls());
    }

    #[tokio::test]
    async fn test_apply_replaces_renamed_application() {
        let (handler, api, store) = fixture();
        let before = stack(&[("android", ApplicationConfig::new("app1", "GCM", "cred"))]);
        apply(&before, &handler, &store).await.unwrap();
        api.clear_calls();

        let after = stack(&[("android", ApplicationConfig::new("app2", "GCM", "cred"))]);
        apply(&after, &handler, &store).await.unwrap();

        let old = arn("GCM", "app1");
        let new = arn("GCM", "app2");
        assert_eq!(
            api.calls(),
            vec![
                Call::Delete(old.clone()),
                Call::Create(new.clone()),
                Call::SetAttributes(new.clone()),
                Call::GetAttributes(new.clone()),
            ]
        );
        assert!(!api.exists(&old));
        assert!(api.exists(&new));
        let record = store.get("android").await.unwrap().unwrap();
        assert_eq!(record.state.id, new);
        assert_eq!(record.state.name, "app2");
    }

    #[tokio::test]
    async fn test_apply_deletes_unconfigured_label() {
        let (handler, api, store) = fixture();
        let both = stack(&[
            ("android", ApplicationConfig::new("app1", "GCM", "cred")),
            ("legacy", ApplicationConfig::new("old-app", "GCM", "cred")),
        ]);
        apply(&both, &handler, &store).await.unwrap();
        api.clear_calls();

        let remaining = stack(&[("android", ApplicationConfig::new("app1", "GCM", "cred"))]);
        apply(&remaining, &handler, &store).await.unwrap();

        let orphan = arn("GCM", "old-app");
        assert_eq!(api.calls(), vec![Call::Delete(orphan.clone())]);
        assert!(!api.exists(&orphan));
        assert_eq!(tracked_id(&store, "legacy").await, None);
        assert_eq!(tracked_id(&store, "android").await, Some(arn("GCM", "app1")));
    }

    #[tokio::test]
    async fn test_apply_keeps_partially_created_application() {
        let (handler, api, store) = fixture();
        let config = stack(&[("android", ApplicationConfig::new("app1", "GCM", "cred"))]);
        api.fail_set_attributes(true);

        let err = apply(&config, &handler, &store).await.unwrap_err();

        assert!(matches!(exit_code_for(&err), CtlExitCode::RuntimeError));
        let partial = store.get("android").await.unwrap().unwrap().state;
        assert_eq!(partial.id, arn("GCM", "app1"));
        assert_eq!(partial.platform_credential, None);

        // The next apply finishes the existing application
        api.fail_set_attributes(false);
        api.clear_calls();
        assert!(matches!(
            plan_action(config.applications.get("android"), Some(&partial)),
            Action::Update(_)
        ));
        apply(&config, &handler, &store).await.unwrap();

        assert!(!api.calls().iter().any(|call| matches!(call, Call::Create(_))));
        let settled = store.get("android").await.unwrap().unwrap().state;
        assert_eq!(settled.id, partial.id);
        assert!(settled.platform_credential.is_some());
    }

    #[tokio::test]
    async fn test_destroy_single_label() {
        let (handler, api, store) = fixture();
        let config = stack(&[
            ("android", ApplicationConfig::new("app1", "GCM", "cred")),
            ("fire", ApplicationConfig::new("app2", "ADM", "cred")),
        ]);
        apply(&config, &handler, &store).await.unwrap();
        api.clear_calls();

        destroy(Some("android"), &handler, &store).await.unwrap();

        assert_eq!(api.calls(), vec![Call::Delete(arn("GCM", "app1"))]);
        assert_eq!(store.list().await.unwrap(), vec!["fire".to_string()]);
    }

    #[tokio::test]
    async fn test_destroy_all_and_untracked_label() {
        let (handler, api, store) = fixture();
        let config = stack(&[
            ("android", ApplicationConfig::new("app1", "GCM", "cred")),
            ("fire", ApplicationConfig::new("app2", "ADM", "cred")),
        ]);
        apply(&config, &handler, &store).await.unwrap();

        destroy(None, &handler, &store).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!api.exists(&arn("GCM", "app1")));
        assert!(!api.exists(&arn("ADM", "app2")));

        api.clear_calls();
        destroy(Some("android"), &handler, &store).await.unwrap();
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_surfaces_delete_failure_and_keeps_record() {
        let (handler, api, store) = fixture();
        let config = stack(&[("android", ApplicationConfig::new("app1", "GCM", "cred"))]);
        apply(&config, &handler, &store).await.unwrap();
        handler.delete(&arn("GCM", "app1")).await.unwrap();
        api.clear_calls();

        let err = destroy(Some("android"), &handler, &store).await.unwrap_err();

        assert!(format!("{err:#}").contains("NotFound"));
        assert_eq!(tracked_id(&store, "android").await, Some(arn("GCM", "app1")));
    }

    #[tokio::test]
    async fn test_persisted_snapshots_hold_no_raw_secrets() {
        let (handler, _api, store) = fixture();
        let config = stack(&[(
            "ios",
            ApplicationConfig::new("ios-app", "APNS", "super-secret-key")
                .with_principal("-----BEGIN CERTIFICATE-----"),
        )]);
        apply(&config, &handler, &store).await.unwrap();

        let record = store.get("ios").await.unwrap().unwrap();
        let rendered = serde_json::to_string(&record).unwrap();
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("BEGIN CERTIFICATE"));
        assert!(rendered.contains(&snsapp_core::hash_content("super-secret-key")));
    }
}
