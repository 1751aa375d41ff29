// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use scroll_machine::app::config::GlobalSettings;
use scroll_machine::app::logging::{NotifyLayer, TelegramNotifier, setup_logging};
use scroll_machine::app::module::Module;
use scroll_machine::domain::account::VolumeVariant;
use scroll_machine::domain::error::AppError;
use scroll_machine::infrastructure::data::inputs::RawInputs;
use scroll_machine::infrastructure::data::registry::AccountRegistry;
use scroll_machine::infrastructure::data::store::{JsonFileStore, RegistryStore};
use scroll_machine::infrastructure::network::connector::EvmConnectorFactory;
use scroll_machine::infrastructure::network::exchange::{ExchangeWithdrawal, OkxClient};
use scroll_machine::infrastructure::network::gas::GasOracle;
use scroll_machine::infrastructure::network::ip_rotation::{IpRotator, NoRotation, ProxyRotator};
use scroll_machine::infrastructure::network::price_feed::PriceFeed;
use scroll_machine::infrastructure::network::provider::ConnectionFactory;
use scroll_machine::services::catalog::ScrollCatalog;
use scroll_machine::services::fee_guard::FeeGuard;
use scroll_machine::services::orchestrator::Orchestrator;
use scroll_machine::services::workflow::{
    Collector, DirectBridge, VolumeCycle, Warmup, Workflow, WorkflowContext,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

const NOTIFY_FLUSH_LIMIT: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(author, version, about = "scroll machine")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Module to run: 1-6 or build, warmup, bridge, cog-volume, volume, collect
    module: Option<String>,
}

fn prompt_module() -> Result<Module, AppError> {
    println!("{}", Module::menu());
    print!("Select module: ");
    std::io::stdout()
        .flush()
        .map_err(|e| AppError::Initialization(format!("stdout: {e}")))?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::Initialization(format!("stdin: {e}")))?;
    line.parse()
}

fn build_database(settings: &GlobalSettings, store: Arc<dyn RegistryStore>) -> Result<(), AppError> {
    let inputs = RawInputs::read(&settings.data_paths())?;
    let accounts = {
        let mut rng = rand::thread_rng();
        AccountRegistry::build(&inputs, settings, &mut rng)?
    };
    let registry = AccountRegistry::create(store, accounts)?;
    tracing::info!(
        target: "registry",
        notify = true,
        accounts = registry.len(),
        path = %settings.data_paths().database.display(),
        "Database built"
    );
    Ok(())
}

fn workflow_for(module: Module, settings: &GlobalSettings) -> Result<Box<dyn Workflow>, AppError> {
    Ok(match module {
        Module::Warmup => Box::new(Warmup),
        Module::Bridge => Box::new(DirectBridge),
        Module::CogVolume => Box::new(VolumeCycle::new(VolumeVariant::LendingCycle)),
        Module::Volume => Box::new(VolumeCycle::new(VolumeVariant::Mixed)),
        Module::Collect => Box::new(Collector::new(settings.tokens_to_collect()?)),
        Module::Build => {
            return Err(AppError::Config("build is not a workflow".to_string()));
        }
    })
}

fn context(settings: Arc<GlobalSettings>) -> Result<WorkflowContext, AppError> {
    let http = ConnectionFactory::http_client(None)?;
    let gas_network = settings.gas_network()?;
    let gas_provider = ConnectionFactory::http(&settings.rpc_url(gas_network))?;
    let fee_guard = FeeGuard::new(
        Arc::new(GasOracle::new(gas_provider, gas_network)),
        settings.gas_threshold_gwei,
        settings.gas_delay_range,
    );
    let exchange: Option<Arc<dyn ExchangeWithdrawal>> = settings.okx_credentials().map(|creds| {
        Arc::new(OkxClient::new(
            http.clone(),
            creds,
            settings.okx_status_attempts,
            settings.okx_status_delay_range,
        )) as Arc<dyn ExchangeWithdrawal>
    });
    Ok(WorkflowContext {
        connectors: Arc::new(EvmConnectorFactory::from_settings(&settings)),
        catalog: Arc::new(ScrollCatalog::new(
            settings.slippage_bps(),
            settings.cog_pool_address,
        )),
        prices: Arc::new(PriceFeed::new(http)),
        exchange,
        fee_guard,
        settings,
    })
}

async fn run(cli: Cli, settings: Arc<GlobalSettings>) -> Result<(), AppError> {
    let module = match cli.module.as_deref() {
        Some(raw) => raw.parse()?,
        None => prompt_module()?,
    };
    let store: Arc<dyn RegistryStore> = Arc::new(JsonFileStore::new(settings.data_paths().database));
    tracing::info!(target: "orchestrator", module = %module, "Selected module");

    if module == Module::Build {
        return build_database(&settings, store);
    }

    let mut registry = AccountRegistry::load(store)?;
    let workflow = workflow_for(module, &settings)?;
    let rotator: Arc<dyn ProxyRotator> = match settings.proxy_change_ip_url() {
        Some(url) if settings.use_mobile_proxy => {
            Arc::new(IpRotator::new(ConnectionFactory::http_client(None)?, url))
        }
        _ => Arc::new(NoRotation),
    };
    let orchestrator = Orchestrator::new(context(settings.clone())?, rotator);
    orchestrator.run(&mut registry, workflow.as_ref()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Arc::new(GlobalSettings::load_with_path(cli.config.as_deref())?);

    let (notify, notifier) = if settings.log_to_telegram
        && let Some(token) = settings.telegram_bot_token()
    {
        let (layer, rx) = NotifyLayer::new(&settings.notify_levels);
        let notifier = TelegramNotifier::spawn(
            ConnectionFactory::http_client(None)?,
            token,
            settings.telegram_ids.clone(),
            rx,
        );
        (Some(layer), Some(notifier))
    } else {
        (None, None)
    };
    setup_logging(&settings.log_level, settings.log_json, notify);

    let result = run(cli, settings).await;
    if let Err(e) = &result {
        tracing::error!(target: "orchestrator", error = %e, "Run aborted");
    }
    if let Some(notifier) = notifier {
        notifier.flush(NOTIFY_FLUSH_LIMIT).await;
    }
    result
}
