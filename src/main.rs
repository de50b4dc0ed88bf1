use corpus::Corpus;
use gui::{App, Bootstrap, APP_TITLE};
use iced::{Application, Settings};
use solefacts_core::{AppConfig, CoreError, ErrorReporter};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "solefacts=info,gui=info,qa_service=info,corpus=info,embedding_engine=info,llm_interface=info";

fn main() -> Result<(), CoreError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting SoleFacts");

    let reporter = ErrorReporter::new();
    let config = AppConfig::load().map_err(|e| {
        reporter.report_error(&e);
        e
    })?;
    let corpus = Corpus::load(&config.data_path).map_err(|e| {
        reporter.report_error(&e);
        e
    })?;
    tracing::info!(
        "Loaded {} posts from {}",
        corpus.len(),
        corpus.source().display()
    );

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(1200.0, 800.0),
            min_size: Some(iced::Size::new(800.0, 600.0)),
            ..Default::default()
        },
        ..Settings::with_flags(Bootstrap::new(config, corpus))
    };

    SoleFactsApp::run(settings).map_err(|e| {
        tracing::error!("Application error: {}", e);
        CoreError::Internal {
            message: format!("GUI error: {e}"),
        }
    })
}

struct SoleFactsApp {
    app: App,
}

impl Application for SoleFactsApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = Bootstrap;

    fn new(flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        let (app, command) = App::new(flags);
        (Self { app }, command)
    }

    fn title(&self) -> String {
        APP_TITLE.to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }
}
