use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use docai_client::{
    ClientEvent, ClientHandle, DocAiClient, EnvironmentAccessor, StaticProvider,
};
use docai_logging::{docai_debug, docai_info};

use crate::args::{client_command, Cli, Command};
use crate::config::{load_config, save_config, CliConfig};
use crate::render::{completion_lines, completion_succeeded, progress_line};

/// Run one subcommand to completion. Returns whether the backend reported
/// success.
pub fn run(cli: Cli) -> Result<bool> {
    if let Command::Init { force } = cli.command {
        return init_config(&cli, force);
    }

    let mut config = load_config(&cli.config)?;
    config.apply_overrides(
        cli.base_url.clone(),
        cli.api_prefix.clone(),
        cli.auth_token.clone(),
    );
    let settings = config.settings();
    let wait = settings.wait_options();

    let mut builder = DocAiClient::builder(settings).platform(EnvironmentAccessor::new());
    if let Some(token) = config.auth_token.clone() {
        builder = builder.auth_provider(StaticProvider::new(token));
    }
    if let Some(code) = cli.login_code.clone() {
        builder = builder.code_provider(StaticProvider::new(code));
    }
    let client = builder.build()?;
    client.set_context(cli.context_patch());
    docai_debug!("client ready for {}", client.settings().base_url);

    let command = client_command(&cli, wait).ok_or_else(|| anyhow!("nothing to send"))?;
    let handle = ClientHandle::new(client).context("failed to start client worker")?;
    let request_id = handle
        .submit(command)
        .ok_or_else(|| anyhow!("client worker stopped before the request was sent"))?;

    loop {
        match handle.recv() {
            Some(ClientEvent::Progress { event, .. }) => {
                println!("{}", progress_line(&event, &Local::now()));
            }
            Some(ClientEvent::Completed {
                request_id: id,
                result,
            }) if id == request_id => {
                let completion = result?;
                for line in completion_lines(&completion) {
                    println!("{line}");
                }
                return Ok(completion_succeeded(&completion));
            }
            Some(ClientEvent::Completed { .. }) => {}
            None => bail!("client worker stopped before request {} completed", request_id),
        }
    }
}

fn init_config(cli: &Cli, force: bool) -> Result<bool> {
    if cli.config.exists() && !force {
        bail!("{:?} already exists; pass --force to overwrite", cli.config);
    }
    let mut config = CliConfig::default();
    config.apply_overrides(
        cli.base_url.clone(),
        cli.api_prefix.clone(),
        cli.auth_token.clone(),
    );
    save_config(&cli.config, &config)?;
    docai_info!("wrote default config to {:?}", cli.config);
    println!("wrote {}", cli.config.display());
    Ok(true)
}
