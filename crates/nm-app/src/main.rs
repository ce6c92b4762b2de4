// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::{Context, Result};
use clap::Parser;
use nm_core::init_tracing;
use nm_platform::AppWindow;
use nm_render::{BootstrapConfig, RenderSize};
use nm_render_vk::RenderContext;
use tracing::{error, info, warn};

use nm_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "nm.toml")]
    config: PathBuf,
    /// Override validation layers + diagnostic messenger: true | false
    #[arg(long)]
    diagnostics: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
struct WindowCfg {
    width: u32,
    height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct AppCfg {
    #[serde(default = "default_app_name")]
    application_name: String,
    #[serde(default)]
    window: WindowCfg,
    #[serde(default = "default_diagnostics")]
    diagnostics: bool,
}

impl Default for AppCfg {
    fn default() -> Self {
        AppCfg {
            application_name: default_app_name(),
            window: WindowCfg::default(),
            diagnostics: default_diagnostics(),
        }
    }
}

fn default_app_name() -> String {
    "Not Minecraft".to_owned()
}
fn default_diagnostics() -> bool {
    cfg!(debug_assertions)
}

fn parse_cfg(src: &str) -> Result<AppCfg> {
    toml::from_str::<AppCfg>(src).context("parse config")
}

fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).unwrap_or_else(|e| {
            warn!("{}: {e:#}; using defaults", path.display());
            AppCfg::default()
        }),
        Err(_) => AppCfg::default(),
    }
}

impl AppCfg {
    fn into_bootstrap(self, diagnostics_override: Option<bool>) -> BootstrapConfig {
        BootstrapConfig {
            size: RenderSize {
                width: self.window.width.max(1),
                height: self.window.height.max(1),
            },
            application_name: self.application_name,
            diagnostics: diagnostics_override.unwrap_or(self.diagnostics),
        }
    }
}

/// Field order matters: the context is dropped before the window it presents to.
struct App {
    cfg: BootstrapConfig,
    context: Option<RenderContext>,
    window: Option<AppWindow>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn bootstrap(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = AppWindow::create(event_loop, &self.cfg)?;
        let context = RenderContext::new(&window, &self.cfg).context("vulkan bootstrap")?;
        info!(
            "running on `{}` (diagnostics={})",
            context.device_name(),
            context.debug_messenger().is_some()
        );
        self.context = Some(context);
        self.window = Some(window);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.context = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(e) = self.bootstrap(event_loop) {
            error!("{e:#}");
            self.failure = Some(e);
            self.shutdown(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        if let WindowEvent::CloseRequested = event {
            info!("CloseRequested");
            self.shutdown(event_loop);
        }
    }
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();
    let cfg = load_cfg(&args.config).into_bootstrap(args.diagnostics);
    info!(
        "{} ({}x{}, diagnostics={})",
        cfg.application_name, cfg.size.width, cfg.size.height, cfg.diagnostics
    );

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        context: None,
        window: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse_cfg("").unwrap();
        assert_eq!(cfg.application_name, "Not Minecraft");
        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
        assert_eq!(cfg.diagnostics, cfg!(debug_assertions));
    }

    #[test]
    fn config_file_overrides_fields() {
        let cfg = parse_cfg(
            r#"
            application_name = "Cubes"
            diagnostics = false

            [window]
            width = 1280
            "#,
        )
        .unwrap();
        assert_eq!(cfg.application_name, "Cubes");
        assert_eq!((cfg.window.width, cfg.window.height), (1280, 600));
        assert!(!cfg.diagnostics);
    }

    #[test]
    fn cli_override_wins_over_file() {
        let cfg = AppCfg {
            diagnostics: false,
            ..AppCfg::default()
        };
        assert!(cfg.clone().into_bootstrap(Some(true)).diagnostics);
        assert!(!cfg.into_bootstrap(None).diagnostics);
    }

    #[test]
    fn zero_window_size_is_bumped() {
        let cfg = AppCfg {
            window: WindowCfg {
                width: 0,
                height: 0,
            },
            ..AppCfg::default()
        };
        let boot = cfg.into_bootstrap(None);
        assert_eq!(boot.size, RenderSize { width: 1, height: 1 });
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_cfg("window = 3").is_err());
    }
}
