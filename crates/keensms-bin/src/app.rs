//! Startup sequence and wiring.

use crate::signals::spawn_signal_forwarder;
use crate::Args;
use anyhow::Context;
use keenetic_client::{KeeneticClient, RouterGateway};
use keensms_bus::{BrokerConfig, MqttPublisher, ParkSettings, ParkedSubscription};
use keensms_config::{
    config_path_from_env, init_logging, resolve_log_level, Config, ConfigError, MqttConfig,
    Settings,
};
use keensms_courier::{
    AccessList, LogAction, MessageAction, PollLoop, PublishAction, ReconciliationEngine,
};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Broker connection settings shared by publisher and parked subscriber.
pub fn broker_config(mqtt: &MqttConfig) -> BrokerConfig {
    BrokerConfig::new(mqtt.host.clone(), mqtt.port)
        .with_credentials(mqtt.username.clone(), mqtt.password.clone())
}

/// Parked subscription settings, when a subscriber id is configured.
pub fn park_settings(mqtt: &MqttConfig) -> Option<ParkSettings> {
    let client_id = mqtt.subscriber_id.as_ref().filter(|id| !id.is_empty())?;
    Some(ParkSettings {
        client_id: client_id.clone(),
        topic: mqtt.topic.clone(),
        interval: mqtt.park_interval(),
        ack_timeout: mqtt.ack_timeout(),
    })
}

/// Await `future` unless shutdown comes first.
async fn unless_shutdown<F: Future>(
    future: F,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Option<F::Output> {
    tokio::select! {
        output = future => Some(output),
        _ = shutdown_rx.recv() => None,
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config_path = args.config.clone().unwrap_or_else(config_path_from_env);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("failed to load settings from {}", config_path.display()))?;

    let level = resolve_log_level(args.log_level.as_deref(), settings.flag("logging.debug"));
    let log_file = settings
        .get("logging.file")
        .and_then(|value| value.as_str())
        .map(PathBuf::from);
    init_logging(&level, log_file);

    info!(config = %config_path.display(), level = %level, "keensms2mqtt starting");

    let missing = settings.missing_required();
    if !missing.is_empty() {
        for setting in &missing {
            error!(setting = %setting, "Required setting is missing");
        }
        return Err(ConfigError::MissingSettings(
            missing.into_iter().map(str::to_string).collect(),
        )
        .into());
    }

    let config = Config::from_settings(&settings).context("invalid configuration")?;

    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_signal_forwarder(shutdown_tx.clone());
    let mut startup_rx = shutdown_tx.subscribe();

    let keenetic = &config.keenetic;
    let Some(router) = unless_shutdown(
        KeeneticClient::connect(&keenetic.host, &keenetic.username, &keenetic.password),
        &mut startup_rx,
    )
    .await
    else {
        info!("Graceful stop");
        return Ok(());
    };
    let router = router.context("failed to open router session")?;

    let Some(interfaces) = unless_shutdown(router.list_interfaces(), &mut startup_rx).await else {
        info!("Graceful stop");
        return Ok(());
    };
    let interfaces = interfaces.context("failed to discover mobile interfaces")?;

    if interfaces.is_empty() {
        warn!("Router reports no mobile interfaces, nothing will be fetched");
    }
    for interface in &interfaces {
        info!(
            interface = %interface.name,
            kind = %interface.kind,
            description = interface.description.as_deref().unwrap_or(""),
            "Mobile interface found"
        );
    }
    let interface_names: Vec<_> = interfaces.into_iter().map(|i| i.name).collect();

    let access = AccessList::new(config.access.phones.iter().cloned());
    if access.is_empty() {
        warn!("access.phones is empty, every message will be skipped");
    }

    let broker = broker_config(&config.mqtt);
    let datetime_format = keenetic.datetime_format.clone();

    let outcome = if args.log_only {
        info!("Log-only mode, messages will not be published");
        let engine = ReconciliationEngine::new(
            router,
            LogAction::new(datetime_format),
            interface_names,
            access,
            keenetic.reconcile_policy(),
        )
        .with_outage_limit(keenetic.outage_cycles);
        drive(engine, &config, args.once, shutdown_tx.subscribe()).await
    } else {
        // Queued delivery for the subscriber needs its session parked
        // before anything is published.
        let _parked = match park_settings(&config.mqtt) {
            Some(settings) => {
                let parking = ParkedSubscription::start(broker.clone(), settings);
                match unless_shutdown(parking, &mut startup_rx).await {
                    Some(parked) => Some(parked),
                    None => {
                        info!("Graceful stop");
                        return Ok(());
                    }
                }
            }
            None => None,
        };

        let publisher = MqttPublisher::new(
            broker,
            config.mqtt.publisher_id.clone(),
            config.mqtt.ack_timeout(),
        );
        let action = PublishAction::new(
            publisher,
            config.mqtt.topic.clone(),
            config.mqtt.qos,
            datetime_format,
        );
        let engine = ReconciliationEngine::new(
            router,
            action,
            interface_names,
            access,
            keenetic.reconcile_policy(),
        )
        .with_outage_limit(keenetic.outage_cycles);
        drive(engine, &config, args.once, shutdown_tx.subscribe()).await
    };

    outcome?;
    info!("Graceful stop");
    Ok(())
}

async fn drive<A: MessageAction>(
    engine: ReconciliationEngine<KeeneticClient, A>,
    config: &Config,
    once: bool,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let interval = config.keenetic.request_interval();
    info!(
        interval_secs = interval.as_secs_f64(),
        policy = ?config.keenetic.reconcile_policy(),
        topic = %config.mqtt.topic,
        "Fetching unread messages"
    );

    let mut poll_loop = PollLoop::new(engine, interval);
    if once {
        if let Some(report) = unless_shutdown(poll_loop.run_once(), &mut shutdown_rx).await {
            report.context("polling cycle failed")?;
        }
        return Ok(());
    }

    poll_loop
        .run(shutdown_rx)
        .await
        .context("polling stopped on a fatal error")
}
