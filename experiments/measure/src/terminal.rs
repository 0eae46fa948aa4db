use {
    base::log,
    session::{ConnectionStatus, Presenter, View},
    std::{io::Write, time::Duration},
    tokio::{sync::watch, time::timeout},
};

/// What the user currently sees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    pub view: View,
    /// Last blocking notice, if any.
    pub notice: Option<String>,
}

/// Prints a status line per view change, and mirrors every [`Screen`] into
/// a watch channel for the main task and the window.
pub struct TerminalPresenter<W> {
    out: W,
    last_line: String,
    screen: watch::Sender<Screen>,
}

impl<W: Write + Send + 'static> TerminalPresenter<W> {
    pub fn new(out: W) -> (Self, watch::Receiver<Screen>) {
        let (screen, receiver) = watch::channel(Screen::default());
        (
            Self {
                out,
                last_line: String::new(),
                screen,
            },
            receiver,
        )
    }

    fn write_line(&mut self, line: &str) {
        if writeln!(self.out, "{line}").and_then(|_| self.out.flush()).is_err() {
            log::warn!("unable to write to terminal");
        }
    }
}

fn ready_or_failed(screen: &Screen) -> bool {
    screen.view.analysis_enabled
        || screen.notice.is_some()
        || screen.view.status == ConnectionStatus::Disconnected
}

/// Wait until analysis can start, or until startup visibly failed.
///
/// Returns `None` when neither happened within `limit`, otherwise whether
/// analysis is enabled.
pub async fn wait_until_ready(
    screens: &mut watch::Receiver<Screen>,
    limit: Duration,
) -> Option<bool> {
    match timeout(limit, screens.wait_for(ready_or_failed)).await {
        Ok(Ok(screen)) => Some(screen.view.analysis_enabled),
        // presenter gone
        Ok(Err(_)) => Some(false),
        Err(_) => None,
    }
}

/// One line summary of `view`.
pub fn render_line(view: &View) -> String {
    let mut line = format!("[{}]", view.status.label());
    if !view.open {
        line.push_str(" closed");
        return line;
    }
    line.push_str(if view.start_camera_enabled {
        " camera off"
    } else {
        " camera on"
    });
    if view.running {
        line.push_str(" | analysing");
    }
    if view.results_visible {
        line.push_str(&format!(
            " | chest {} | waist {} | hip {}",
            view.measurements.chest, view.measurements.waist, view.measurements.hip
        ));
    }
    if let Some(probe) = &view.probe {
        line.push_str(&format!(" | backend {}", probe.status));
    }
    line
}

impl<W: Write + Send + 'static> Presenter for TerminalPresenter<W> {
    fn present(&mut self, view: &View) {
        let line = render_line(view);
        if line != self.last_line {
            self.write_line(&line);
            self.last_line = line;
        }
        self.screen.send_modify(|screen| screen.view = view.clone());
    }

    fn notice(&mut self, message: &str) {
        self.write_line(&format!("!! {message}"));
        self.screen
            .send_modify(|screen| screen.notice = Some(message.to_string()));
    }
}
