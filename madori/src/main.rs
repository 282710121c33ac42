mod app;
mod core;
mod effect;
mod event;
mod ipc;
mod platform;
mod theme;

use std::path::PathBuf;

use anyhow::{bail, Result};
use argh::FromArgs;
use ipc::IpcClient;
use madori_ipc::{Command, EventFilter, FloatRule, Response, WindowAttributes, WindowId};
use tracing_subscriber::EnvFilter;

use crate::core::Config;
use crate::theme::WatchMode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Madori - floating rules and live theme reloading for tiling window managers
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    ManageWindow(ManageWindowCmd),
    UnmanageWindow(UnmanageWindowCmd),
    SetFloating(SetFloatingCmd),
    Classify(ClassifyCmd),
    ReapplyRules(ReapplyRulesCmd),
    ListWindows(ListWindowsCmd),
    ListFloating(ListFloatingCmd),
    WindowStats(WindowStatsCmd),
    ProblematicWindows(ProblematicWindowsCmd),
    AddRule(AddRuleCmd),
    RemoveRule(RemoveRuleCmd),
    AddForceFloat(AddForceFloatCmd),
    RemoveForceFloat(RemoveForceFloatCmd),
    ListRules(ListRulesCmd),
    ValidateRules(ValidateRulesCmd),
    GetColors(GetColorsCmd),
    ThemeStatus(ThemeStatusCmd),
    ReloadTheme(ReloadThemeCmd),
    StartWatching(StartWatchingCmd),
    StopWatching(StopWatchingCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the madori daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// config file (default: $XDG_CONFIG_HOME/madori/config.json)
    #[argh(option)]
    config: Option<PathBuf>,
    /// theme file to watch, overriding the config
    #[argh(option)]
    theme_file: Option<PathBuf>,
    /// poll the theme file instead of using file notifications
    #[argh(switch)]
    poll: bool,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Register a window and apply the floating rules to it
#[derive(FromArgs)]
#[argh(subcommand, name = "manage-window")]
struct ManageWindowCmd {
    /// window id
    #[argh(positional)]
    window_id: WindowId,
    /// instance name (first WM_CLASS string)
    #[argh(option)]
    instance: Option<String>,
    /// class name (second WM_CLASS string)
    #[argh(option)]
    class: Option<String>,
    /// window title
    #[argh(option)]
    title: Option<String>,
    /// id of the window this one is transient for
    #[argh(option)]
    transient_for: Option<WindowId>,
    /// maximum width from the size hints
    #[argh(option)]
    max_width: Option<u32>,
}

/// Forget a window
#[derive(FromArgs)]
#[argh(subcommand, name = "unmanage-window")]
struct UnmanageWindowCmd {
    /// window id
    #[argh(positional)]
    window_id: WindowId,
}

/// Record a floating toggle made on the host
#[derive(FromArgs)]
#[argh(subcommand, name = "set-floating")]
struct SetFloatingCmd {
    /// window id
    #[argh(positional)]
    window_id: WindowId,
    /// true or false
    #[argh(positional)]
    floating: bool,
}

/// Evaluate the floating rules for a window without registering it
#[derive(FromArgs)]
#[argh(subcommand, name = "classify")]
struct ClassifyCmd {
    /// instance name (first WM_CLASS string)
    #[argh(option)]
    instance: Option<String>,
    /// class name (second WM_CLASS string)
    #[argh(option)]
    class: Option<String>,
    /// window title
    #[argh(option)]
    title: Option<String>,
    /// id of the window this one is transient for
    #[argh(option)]
    transient_for: Option<WindowId>,
    /// maximum width from the size hints
    #[argh(option)]
    max_width: Option<u32>,
}

/// Re-apply floating rules to every managed window
#[derive(FromArgs)]
#[argh(subcommand, name = "reapply-rules")]
struct ReapplyRulesCmd {}

/// List all managed windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-windows")]
struct ListWindowsCmd {}

/// List floating windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-floating")]
struct ListFloatingCmd {}

/// Show window statistics
#[derive(FromArgs)]
#[argh(subcommand, name = "window-stats")]
struct WindowStatsCmd {}

/// List windows whose state disagrees with the rules
#[derive(FromArgs)]
#[argh(subcommand, name = "problematic-windows")]
struct ProblematicWindowsCmd {}

/// Add a floating rule
#[derive(FromArgs)]
#[argh(subcommand, name = "add-rule")]
struct AddRuleCmd {
    /// match WM_CLASS instance or class name
    #[argh(option)]
    wm_class: Option<String>,
    /// match a fragment of the title
    #[argh(option)]
    title: Option<String>,
}

/// Remove a floating rule
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-rule")]
struct RemoveRuleCmd {
    /// class rule to remove
    #[argh(option)]
    wm_class: Option<String>,
    /// title rule to remove
    #[argh(option)]
    title: Option<String>,
}

/// Always float an application (by class name)
#[derive(FromArgs)]
#[argh(subcommand, name = "add-force-float")]
struct AddForceFloatCmd {
    /// application class name
    #[argh(positional)]
    app: String,
}

/// Stop force-floating an application
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-force-float")]
struct RemoveForceFloatCmd {
    /// application class name
    #[argh(positional)]
    app: String,
}

/// List floating rules
#[derive(FromArgs)]
#[argh(subcommand, name = "list-rules")]
struct ListRulesCmd {}

/// Check the floating rules for problems
#[derive(FromArgs)]
#[argh(subcommand, name = "validate-rules")]
struct ValidateRulesCmd {}

/// Print the current colors as JSON
#[derive(FromArgs)]
#[argh(subcommand, name = "get-colors")]
struct GetColorsCmd {}

/// Show the theme watcher status
#[derive(FromArgs)]
#[argh(subcommand, name = "theme-status")]
struct ThemeStatusCmd {}

/// Reload the theme file now
#[derive(FromArgs)]
#[argh(subcommand, name = "reload-theme")]
struct ReloadThemeCmd {}

/// Start watching the theme file
#[derive(FromArgs)]
#[argh(subcommand, name = "start-watching")]
struct StartWatchingCmd {}

/// Stop watching the theme file
#[derive(FromArgs)]
#[argh(subcommand, name = "stop-watching")]
struct StopWatchingCmd {}

/// Stream state events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// send the current state first
    #[argh(switch)]
    snapshot: bool,
    /// window events only
    #[argh(switch)]
    windows: bool,
    /// theme events only
    #[argh(switch)]
    theme: bool,
}

/// Quit the madori daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help
            let args: Vec<&str> = vec!["madori", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("madori {} starting", VERSION);
            let mut config = Config::load(cmd.config.as_deref())?;
            if let Some(theme_file) = cmd.theme_file {
                config.theme_file = crate::core::expand_home(&theme_file);
            }
            if cmd.poll {
                config.watch_mode = WatchMode::Poll;
            }
            app::App::new(config).run()
        }
        Some(SubCommand::Version(_)) => {
            println!("madori {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => ipc::subscribe_and_print(
            cmd.snapshot,
            EventFilter {
                windows: cmd.windows,
                theme: cmd.theme,
            },
        ),
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;
    print_response(response)
}

fn print_response(response: Response) -> Result<()> {
    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Verdict { floating, reason } => match reason {
            Some(reason) if floating => println!("float ({})", reason),
            _ => println!("tile"),
        },
        Response::Windows { windows } => {
            for w in windows {
                println!(
                    "{}: {} - {}{}{}",
                    w.id,
                    w.name,
                    w.title.as_deref().unwrap_or(""),
                    if w.is_floating { " [floating]" } else { "" },
                    w.parent
                        .map(|p| format!(" (transient for {})", p))
                        .unwrap_or_default()
                );
            }
        }
        Response::Stats { stats } => {
            println!("Total windows: {}", stats.total_windows);
            println!("Floating: {}", stats.floating_windows);
            println!("Tiled: {}", stats.tiled_windows);
            println!("Transient: {}", stats.transient_windows);
            for (class, count) in &stats.windows_by_class {
                println!("  {}: {}", class, count);
            }
        }
        Response::Problems { windows } => {
            if windows.is_empty() {
                println!("No problematic windows");
            }
            for w in windows {
                println!("{}: {} (floating={})", w.id, w.name, w.is_floating);
                for issue in &w.issues {
                    println!("  - {}", issue);
                }
            }
        }
        Response::Reapplied { changed } => {
            println!("{} windows changed", changed);
        }
        Response::Rules { rules } => {
            println!("Force floating apps:");
            for app in &rules.force_floating_apps {
                println!("  {}", app);
            }
            println!("Floating rules:");
            for rule in &rules.floating_rules {
                println!("  {}", rule);
            }
        }
        Response::Validation { report } => {
            println!(
                "{} ({} rules, {} force-float apps)",
                if report.valid { "valid" } else { "invalid" },
                report.rule_count,
                report.force_float_count
            );
            for warning in &report.warnings {
                println!("warning: {}", warning);
            }
            for error in &report.errors {
                println!("error: {}", error);
            }
            if !report.valid {
                std::process::exit(1);
            }
        }
        Response::Colors { colors } => {
            println!("{}", serde_json::to_string_pretty(&colors)?);
        }
        Response::Theme { status } => {
            println!("File: {}", status.path);
            println!("State: {} ({})", status.state, status.mode);
            println!("Source: {:?}", status.source);
            println!("Background: {}", status.background);
            println!("Foreground: {}", status.foreground);
            if let Some(at) = status.last_reload {
                println!("Last reload: {}", at);
            }
        }
        Response::Reload { result } => {
            println!("{:?}", result);
        }
    }

    Ok(())
}

fn window_attributes(
    instance: Option<String>,
    class: Option<String>,
    title: Option<String>,
    transient_for: Option<WindowId>,
    max_width: Option<u32>,
) -> WindowAttributes {
    let mut attrs = WindowAttributes {
        wm_instance: instance,
        wm_class: class,
        title,
        transient_for,
        ..Default::default()
    };
    if let Some(max_width) = max_width {
        attrs = attrs.with_max_width(max_width);
    }
    attrs
}

fn parse_rule(wm_class: Option<String>, title: Option<String>) -> Result<FloatRule> {
    match (wm_class, title) {
        (Some(class), None) => Ok(FloatRule::wm_class(class)),
        (None, Some(title)) => Ok(FloatRule::title(title)),
        _ => bail!("Specify exactly one of --wm-class or --title"),
    }
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            bail!("not a daemon command")
        }
        SubCommand::ManageWindow(cmd) => Ok(Command::ManageWindow {
            window_id: cmd.window_id,
            attributes: window_attributes(
                cmd.instance,
                cmd.class,
                cmd.title,
                cmd.transient_for,
                cmd.max_width,
            ),
        }),
        SubCommand::UnmanageWindow(cmd) => Ok(Command::UnmanageWindow {
            window_id: cmd.window_id,
        }),
        SubCommand::SetFloating(cmd) => Ok(Command::SetFloating {
            window_id: cmd.window_id,
            floating: cmd.floating,
        }),
        SubCommand::Classify(cmd) => Ok(Command::Classify {
            attributes: window_attributes(
                cmd.instance,
                cmd.class,
                cmd.title,
                cmd.transient_for,
                cmd.max_width,
            ),
        }),
        SubCommand::ReapplyRules(_) => Ok(Command::ReapplyRules),
        SubCommand::ListWindows(_) => Ok(Command::ListWindows),
        SubCommand::ListFloating(_) => Ok(Command::ListFloating),
        SubCommand::WindowStats(_) => Ok(Command::WindowStats),
        SubCommand::ProblematicWindows(_) => Ok(Command::ProblematicWindows),
        SubCommand::AddRule(cmd) => Ok(Command::AddRule {
            rule: parse_rule(cmd.wm_class, cmd.title)?,
        }),
        SubCommand::RemoveRule(cmd) => Ok(Command::RemoveRule {
            rule: parse_rule(cmd.wm_class, cmd.title)?,
        }),
        SubCommand::AddForceFloat(cmd) => Ok(Command::AddForceFloat { app: cmd.app }),
        SubCommand::RemoveForceFloat(cmd) => Ok(Command::RemoveForceFloat { app: cmd.app }),
        SubCommand::ListRules(_) => Ok(Command::ListRules),
        SubCommand::ValidateRules(_) => Ok(Command::ValidateRules),
        SubCommand::GetColors(_) => Ok(Command::GetColors),
        SubCommand::ThemeStatus(_) => Ok(Command::ThemeStatus),
        SubCommand::ReloadTheme(_) => Ok(Command::ReloadTheme),
        SubCommand::StartWatching(_) => Ok(Command::StartWatching),
        SubCommand::StopWatching(_) => Ok(Command::StopWatching),
        SubCommand::Quit(_) => Ok(Command::Quit),
    }
}
