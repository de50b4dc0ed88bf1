use corpus::{parse_filter_query, search_posts, Corpus, SearchResults};
use iced::widget::{button, column, container, radio, row, scrollable, text, text_input, Column};
use iced::{Command, Element, Length, Theme};
use qa_service::QueryEngine;
use solefacts_core::{AppConfig, CoreError, ErrorExt, ErrorReporter, QueryResponse, Tags};
use std::sync::Arc;
use tracing::{debug, error, info};


pub const APP_TITLE: &str = "SoleFacts - Running Shoe Insights";

const NO_LINK: &str = "(no link)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Ask,
    Filter,
}

impl Mode {
    fn placeholder(self) -> &'static str {
        match self {
            Mode::Ask => "Ask about running shoes, e.g. which shoes help with heel pain?",
            Mode::Filter => "model:pegasus feature:cushioning user:beginner sentiment:positive",
        }
    }

    fn action_label(self) -> &'static str {
        match self {
            Mode::Ask => "Ask",
            Mode::Filter => "Search",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    ModeSelected(Mode),
    InputChanged(String),
    Submit,
    EngineReady(Result<Arc<QueryEngine>, String>),
    Answered(Result<QueryResponse, String>),
}

/// Everything the window needs that was loaded before it opened.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub config: AppConfig,
    pub corpus: Arc<Corpus>,
}

impl Bootstrap {
    pub fn new(config: AppConfig, corpus: Corpus) -> Self {
        Self {
            config,
            corpus: Arc::new(corpus),
        }
    }
}

#[derive(Debug)]
enum EngineState {
    Indexing,
    Ready(Arc<QueryEngine>),
    Failed(String),
}

#[derive(Debug)]
enum Outcome {
    Answer(QueryResponse),
    Matches(SearchResults),
    Error(String),
}

pub struct App {
    config: AppConfig,
    corpus: Arc<Corpus>,
    engine: EngineState,
    mode: Mode,
    input: String,
    busy: bool,
    outcome: Option<Outcome>,
}

impl App {
    /// Opens in the indexing state and returns the command that builds the engine.
    pub fn new(bootstrap: Bootstrap) -> (Self, Command<Message>) {
        let Bootstrap { config, corpus } = bootstrap;
        let build = build_engine(config.clone(), &corpus);

        let app = Self {
            config,
            corpus,
            engine: EngineState::Indexing,
            mode: Mode::default(),
            input: String::new(),
            busy: false,
            outcome: None,
        };
        (app, build)
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::ModeSelected(mode) => {
                if mode != self.mode {
                    self.mode = mode;
                    self.input.clear();
                    self.outcome = None;
                }
                Command::none()
            }
            Message::InputChanged(value) => {
                self.input = value;
                Command::none()
            }
            Message::Submit => {
                if self.busy {
                    return Command::none();
                }
                match self.submit() {
                    Ok(command) => command,
                    Err(e) => {
                        ErrorReporter::new().report_warning(&e);
                        self.outcome = Some(Outcome::Error(e.user_friendly_message()));
                        Command::none()
                    }
                }
            }
            Message::EngineReady(Ok(engine)) => {
                info!("Question answering ready: {:?}", engine);
                self.engine = EngineState::Ready(engine);
                Command::none()
            }
            Message::EngineReady(Err(message)) => {
                error!("Question answering unavailable: {}", message);
                self.engine = EngineState::Failed(message);
                Command::none()
            }
            Message::Answered(result) => {
                self.busy = false;
                self.outcome = Some(match result {
                    Ok(response) => Outcome::Answer(response),
                    Err(message) => Outcome::Error(message),
                });
                Command::none()
            }
        }
    }

    fn submit(&mut self) -> Result<Command<Message>, CoreError> {
        match self.mode {
            Mode::Filter => {
                let filters = parse_filter_query(&self.input)?;
                debug!("Filtering with {:?}", filters);
                let results = search_posts(self.corpus.posts(), &filters, self.config.result_limit);
                self.outcome = Some(Outcome::Matches(results));
                Ok(Command::none())
            }
            Mode::Ask => {
                let question = self.input.trim().to_string();
                if question.is_empty() {
                    return Err(CoreError::invalid_input("type a question first"));
                }
                let engine = match &self.engine {
                    EngineState::Ready(engine) => Arc::clone(engine),
                    EngineState::Indexing => {
                        self.outcome = Some(Outcome::Error(
                            "Still indexing posts, try again in a moment.".to_string(),
                        ));
                        return Ok(Command::none());
                    }
                    EngineState::Failed(message) => {
                        self.outcome = Some(Outcome::Error(format!(
                            "Question answering is unavailable: {}",
                            message
                        )));
                        return Ok(Command::none());
                    }
                };

                self.busy = true;
                self.outcome = None;
                Ok(Command::perform(
                    async move {
                        engine.query(&question).await.map_err(|e| {
                            ErrorReporter::new().report_error(&e);
                            e.user_friendly_message()
                        })
                    },
                    Message::Answered,
                ))
            }
        }
    }

    fn can_submit(&self) -> bool {
        !self.busy
    }

    fn status_line(&self) -> String {
        match &self.engine {
            EngineState::Indexing => format!("Indexing {} posts...", self.corpus.len()),
            EngineState::Ready(engine) => format!("{} posts indexed", engine.document_count()),
            EngineState::Failed(message) => format!("Indexing failed: {}", message),
        }
    }

    pub fn view(&self) -> Element<Message, Theme> {
        let title: Element<Message, Theme> = text(APP_TITLE).size(24).into();

        let modes = row![
            radio("Ask a question", Mode::Ask, Some(self.mode), Message::ModeSelected),
            radio("Filter posts", Mode::Filter, Some(self.mode), Message::ModeSelected),
        ]
        .spacing(20);

        let mut input = text_input(self.mode.placeholder(), &self.input)
            .on_input(Message::InputChanged)
            .padding(10);
        let mut submit = button(text(self.mode.action_label())).padding(10);
        if self.can_submit() {
            input = input.on_submit(Message::Submit);
            submit = submit.on_press(Message::Submit);
        }

        let form = row![input, submit].spacing(10);

        let main_content: Element<Message, Theme> = column![
            title,
            text(self.status_line()).size(12),
            modes,
            form,
            scrollable(container(self.outcome_view()).padding(20)).height(Length::Fill),
        ]
        .spacing(20)
        .into();

        container(main_content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into()
    }

    fn outcome_view(&self) -> Element<Message, Theme> {
        if self.busy {
            return text("Thinking...").size(16).into();
        }

        match &self.outcome {
            None => text("").into(),
            Some(Outcome::Error(message)) => text(message).size(16).into(),
            Some(Outcome::Answer(response)) => {
                let mut sources = Column::new().spacing(5);
                if response.sources.is_empty() {
                    sources = sources.push(text("No source posts were retrieved.").size(12));
                }
                for source in &response.sources {
                    sources = sources.push(text(link_label(&source.url)).size(12));
                }

                column![
                    text(&response.answer).size(16),
                    text("Sources").size(14),
                    sources
                ]
                .spacing(10)
                .into()
            }
            Some(Outcome::Matches(results)) => {
                let mut list = Column::new()
                    .spacing(10)
                    .push(text(format!("Found {} matching posts", results.found)).size(16));

                if results.is_empty() {
                    list = list.push(text("No posts match those filters.").size(14));
                }

                for result in &results.results {
                    let mut rows = Column::new()
                        .spacing(5)
                        .push(text(&result.title).size(16))
                        .push(text(link_label(&result.url)).size(12));
                    for line in describe_tags(&result.tags) {
                        rows = rows.push(text(line).size(12));
                    }
                    rows = rows.push(text(format_sentiment(result.score)).size(12));
                    list = list.push(container(rows).padding(10));
                }

                if results.is_truncated() {
                    list = list.push(
                        text(format!(
                            "Showing the first {} of {}",
                            results.results.len(),
                            results.found
                        ))
                        .size(12),
                    );
                }
                list.into()
            }
        }
    }
}

fn build_engine(config: AppConfig, corpus: &Corpus) -> Command<Message> {
    let posts = Arc::new(corpus.posts().to_vec());
    Command::perform(
        async move {
            QueryEngine::build_in_background(config, posts)
                .await
                .map(Arc::new)
                .map_err(|e| {
                    ErrorReporter::new().report_error(&e);
                    e.user_friendly_message()
                })
        },
        Message::EngineReady,
    )
}

/// Posts scraped without a permalink still get a visible row.
fn link_label(url: &str) -> &str {
    if url.trim().is_empty() {
        NO_LINK
    } else {
        url
    }
}

fn describe_tags(tags: &Tags) -> Vec<String> {
    let mut lines = Vec::new();
    if !tags.model_mentions.is_empty() {
        lines.push(format!("Models: {}", tags.model_mentions.join(", ")));
    }
    if !tags.feature_mentions.is_empty() {
        lines.push(format!("Features: {}", tags.feature_mentions.join(", ")));
    }
    if !tags.user_type.is_empty() {
        lines.push(format!("Runner: {}", tags.user_type.join(", ")));
    }
    lines
}

fn format_sentiment(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("Sentiment: {:.2}", score),
        None => "Sentiment: n/a".to_string(),
    }
}
