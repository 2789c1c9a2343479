mod core;
mod i18n;
mod logging;
mod plugins;

use clap::{Arg, ArgAction, ArgMatches, Command};
use crate::core::config::{FormConfig, DEFAULT_BASE_URL};
use crate::core::events::FormEvent;
use crate::core::form::{Control, FormController, FormView};
use crate::core::model::{AudioFormat, FormOption, Resolution, VideoFormat};
use crate::core::status::{DownloadStatus, StatusTone};
use crate::i18n::{get_messages, Locale, Messages};
use crate::plugins::registry::{FormCliConfig, PluginRegistry};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use tracing::debug;

fn possible<T: FormOption>() -> Vec<&'static str> {
    T::ALL.iter().map(|o| o.as_str()).collect()
}

fn field_args(cmd: Command, url_required: bool) -> Command {
    cmd.arg(
        Arg::new("url")
            .help("Video URL")
            .required(url_required)
            .num_args(1),
    )
    .arg(
        Arg::new("resolution")
            .long("resolution")
            .short('r')
            .help("Video resolution")
            .value_parser(possible::<Resolution>())
            .default_value("720p")
            .num_args(1),
    )
    .arg(
        Arg::new("format")
            .long("format")
            .short('f')
            .help("Video container format")
            .value_parser(possible::<VideoFormat>())
            .default_value("mp4")
            .num_args(1),
    )
    .arg(
        Arg::new("audio_only")
            .long("audio-only")
            .short('a')
            .help("Request the audio track only")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("audio_format")
            .long("audio-format")
            .help("Audio format (with --audio-only)")
            .value_parser(possible::<AudioFormat>())
            .default_value("mp3")
            .num_args(1),
    )
}

fn build_cli(registry: &PluginRegistry) -> Command {
    let download = field_args(Command::new("download").about("Submit a download request to the service"), true).arg(
        Arg::new("show_output")
            .long("show-output")
            .help("Print the service's output after a successful download")
            .action(ArgAction::SetTrue),
    );
    let download = registry.augment_command(download);

    let form = field_args(Command::new("form").about("Show the form for the given fields without submitting"), false);

    let status = registry.augment_command(Command::new("status").about("Check whether the download service is running"));

    Command::new("form-downloader")
        .about("Client for a remote video/audio download service")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base_url")
                .long("base-url")
                .help("Base URL of the download service")
                .default_value(DEFAULT_BASE_URL)
                .global(true)
                .num_args(1),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .help("UI language (en, zh)")
                .default_value("en")
                .global(true)
                .num_args(1),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(download)
        .subcommand(form)
        .subcommand(status)
}

/// Copies the field flags into the controller, one update per field.
fn fill_form(ctl: &FormController, m: &ArgMatches) -> anyhow::Result<()> {
    if let Some(url) = m.get_one::<String>("url") {
        ctl.set_url(url.clone());
    }
    if let Some(s) = m.get_one::<String>("resolution") {
        ctl.set_resolution(s.parse()?);
    }
    if let Some(s) = m.get_one::<String>("format") {
        ctl.set_format(s.parse()?);
    }
    ctl.set_audio_only(m.get_flag("audio_only"));
    if let Some(s) = m.get_one::<String>("audio_format") {
        ctl.set_audio_format(s.parse()?);
    }
    Ok(())
}

fn print_form(view: &FormView) {
    println!("{}", view.title);
    for c in &view.controls {
        match c {
            Control::Url { label, placeholder, value, .. } => {
                let shown = if value.is_empty() { format!("<{placeholder}>") } else { value.clone() };
                println!("  {label} {shown}");
            }
            Control::AudioOnly { label, checked } => {
                println!("  [{}] {label}", if *checked { "x" } else { " " });
            }
            Control::Select { label, selected, options, .. } => {
                let opts: Vec<String> = options
                    .iter()
                    .map(|o| if o.value == *selected { format!("({})", o.label) } else { o.label.to_string() })
                    .collect();
                println!("  {label} {}", opts.join(" | "));
            }
        }
    }
    let button = if view.submit_enabled { format!("[ {} ]", view.submit_label) } else { format!("( {} )", view.submit_label) };
    println!("  {button}");
    if let Some(st) = &view.status {
        println!("{}", status_line(&st.text, st.tone));
    }
}

fn status_line(text: &str, tone: StatusTone) -> String {
    match tone {
        StatusTone::Success => format!("[OK] {text}"),
        StatusTone::Error => format!("[ERR] {text}"),
    }
}

async fn run_download(ctl: FormController, msgs: &'static Messages, show_output: bool) -> anyhow::Result<ExitCode> {
    debug!(view = ?ctl.render(), "form before submit");

    let mut rx = ctl.subscribe();
    let ui_task = tokio::spawn(async move {
        let pb = ProgressBar::new_spinner();
        if let Ok(sty) = ProgressStyle::with_template("{spinner:.green} {wide_msg}") {
            pb.set_style(sty.tick_chars("|/-\\ "));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        loop {
            match rx.recv().await {
                Ok(FormEvent::StatusChanged { status: DownloadStatus::InProgress }) => {
                    pb.set_message(msgs.status_starting);
                }
                Ok(FormEvent::Submitted { submission_id, request }) => {
                    pb.set_message(format!("{} ({}) {}", msgs.submit_busy, submission_id, request.url));
                }
                Ok(FormEvent::BusyChanged { busy: false }) | Err(_) => break,
                Ok(_) => {}
            }
        }
        pb.finish_and_clear();
    });

    let settled = ctl.submit().await;
    if settled.is_err() {
        // Rejected before any event was sent.
        ui_task.abort();
    }
    let _ = ui_task.await;

    let status = settled.context("submit")?;
    if let (Some(text), Some(tone)) = (status.text(msgs), status.tone()) {
        println!("{}", status_line(&text, tone));
    }
    if show_output {
        if let Some(out) = ctl.last_output() {
            println!("{}", out.trim_end());
        }
    }
    Ok(match status {
        DownloadStatus::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let registry = PluginRegistry::with_defaults();
    let app = build_cli(&registry);
    let matches = app.get_matches();

    logging::init_tracing(matches.get_flag("verbose"));

    let locale = Locale::from_str(matches.get_one::<String>("locale").map(String::as_str).unwrap_or("en"));
    let base_url = matches.get_one::<String>("base_url").map(String::as_str).unwrap_or(DEFAULT_BASE_URL);
    let config = FormConfig::new(base_url, locale)?;
    let msgs = get_messages(config.locale);
    debug!(base_url = %config.base_url, ?locale, plugins = ?registry.plugin_names(), "configuration");

    match matches.subcommand() {
        Some(("download", m)) => {
            let mut cfg = FormCliConfig::default();
            registry.apply_matches(m, &mut cfg)?;
            let backend = registry.backend_for(&config.base_url, cfg.backend_ctx)?;
            let ctl = FormController::new(backend, msgs);
            fill_form(&ctl, m)?;
            run_download(ctl, msgs, m.get_flag("show_output")).await
        }
        Some(("form", m)) => {
            let backend = registry.backend_for(&config.base_url, FormCliConfig::default().backend_ctx)?;
            let ctl = FormController::new(backend, msgs);
            fill_form(&ctl, m)?;
            print_form(&ctl.render());
            Ok(ExitCode::SUCCESS)
        }
        Some(("status", m)) => {
            let mut cfg = FormCliConfig::default();
            registry.apply_matches(m, &mut cfg)?;
            let backend = registry.backend_for(&config.base_url, cfg.backend_ctx)?;
            match backend.service_status().await {
                Ok(st) => {
                    println!("{} {}: {}", status_line(msgs.service_label, StatusTone::Success), config.base_url, st.status);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}", status_line(&format!("{}: {}: {}", msgs.error_prefix, config.base_url, e), StatusTone::Error));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
