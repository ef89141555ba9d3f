// bases/download_cli/src/app.rs
use crate::config::Config;
use crate::output::OutputHandler;
use color_eyre::Result;
use download_orchestrator::Orchestrator;
use std::path::PathBuf;
use std::sync::Arc;

pub struct App {
    config: Config,
    output: OutputHandler,
}

impl App {
    pub fn new(config: Config) -> Self {
        let output = OutputHandler::new(config.verbose);
        Self { config, output }
    }

    /// Returns whether a file was produced (or, with `--info-only`, found)
    pub async fn run(&self) -> Result<bool> {
        let output = self.output;
        let orchestrator = Arc::new(
            Orchestrator::new(self.config.engine.clone())?
                .on_status(move |message| output.print_status(message))
                .on_progress(move |fraction| output.print_progress(fraction)),
        );

        self.output.print_fetch_start(&self.config.url);
        let summary = {
            let orchestrator = Arc::clone(&orchestrator);
            let url = self.config.url.clone();
            tokio::task::spawn_blocking(move || orchestrator.fetch_summary(&url)).await?
        };

        match &summary {
            Some(summary) => self.output.print_summary(summary),
            None => self.output.print_summary_failed(),
        }
        if self.config.info_only {
            return Ok(summary.is_some());
        }

        let path = self.download(orchestrator).await?;
        match &path {
            Some(path) => self.output.print_download_complete(path),
            None => self.output.print_download_failed(),
        }
        Ok(path.is_some())
    }

    async fn download(&self, orchestrator: Arc<Orchestrator>) -> Result<Option<PathBuf>> {
        let cancel = orchestrator.cancel_handle();
        let url = self.config.url.clone();
        let quality = self.config.quality;
        let output_dir = self.config.output_dir.clone();

        let mut task = tokio::task::spawn_blocking(move || {
            orchestrator.download(&url, quality, &output_dir)
        });

        tokio::select! {
            result = &mut task => return Ok(result?),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Interrupted, cancelling download");
                cancel.cancel();
            }
        }

        // The engine stops at its next progress tick
        Ok(task.await?)
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
