use std::path::PathBuf;

use anyhow::{bail, Context};
use application::lab_service::PromptLab;
use application::rag_service::{RagService, RagSettings};
use application::session_context::SessionContext;
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use domain::models::GenerationOptions;
use domain::technique::{PromptTechnique, RagTechnique};
use domain::LabError;
use infrastructure::config::Config;
use infrastructure::document_loader::DocumentLoader;
use infrastructure::embedder::Embedder;
use infrastructure::index_store::IndexStore;
use infrastructure::ollama_client::OllamaClient;
use shared::confirmation::ask_confirmation;
use shared::types::Result;

use crate::output::{print_techniques, print_turn, report_lab_error};

#[derive(Parser, Debug)]
#[command(name = "prompt-lab")]
#[command(about = "Prompt engineering lab with RAG over local documents")]
pub struct Cli {
    /// List the prompt techniques with examples
    #[arg(long)]
    pub techniques: bool,

    /// Send one prompt using --technique (the default mode)
    #[arg(long)]
    pub lab: bool,

    /// Interactive chat with the model
    #[arg(long)]
    pub chat: bool,

    /// Ingest the given files or directories into the document index
    #[arg(long)]
    pub ingest: bool,

    /// Ask a question against the ingested documents
    #[arg(long)]
    pub rag: bool,

    /// List the models available in the runtime
    #[arg(long)]
    pub models: bool,

    /// Delete the stored document index
    #[arg(long)]
    pub clear_index: bool,

    #[arg(long, value_parser = parse_prompt_technique, default_value = "zero-shot")]
    pub technique: PromptTechnique,

    #[arg(long, value_parser = parse_rag_technique, default_value = "standard-rag")]
    pub rag_technique: RagTechnique,

    /// Chat model (overrides OLLAMA_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Embedding model (overrides OLLAMA_EMBED_MODEL)
    #[arg(long)]
    pub embed_model: Option<String>,

    /// Number of chunks retrieved per question (overrides TOP_K)
    #[arg(short = 'k', long, value_parser = parse_top_k)]
    pub top_k: Option<usize>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Prompt, question, or paths to ingest
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

fn parse_prompt_technique(s: &str) -> std::result::Result<PromptTechnique, String> {
    s.parse().map_err(|e: LabError| e.to_string())
}

fn parse_rag_technique(s: &str) -> std::result::Result<RagTechnique, String> {
    s.parse().map_err(|e: LabError| e.to_string())
}

fn parse_top_k(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(k) => Ok(k),
        Err(e) => Err(e.to_string()),
    }
}

pub struct CliApp {
    config: Config,
    options: GenerationOptions,
    session: SessionContext,
}

impl CliApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            options: GenerationOptions::default(),
            session: SessionContext::new("cli"),
        }
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        self.apply_overrides(&cli);
        let input = cli.args.join(" ");
        if cli.techniques {
            print_techniques();
            Ok(())
        } else if cli.models {
            self.handle_models().await
        } else if cli.clear_index {
            self.handle_clear_index()
        } else if cli.ingest {
            self.handle_ingest(&cli.args).await
        } else if cli.rag {
            self.handle_rag(&input, cli.rag_technique).await
        } else if cli.chat {
            self.handle_chat().await
        } else {
            self.handle_lab(cli.technique, &input).await
        }
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(model) = &cli.model {
            self.config.ollama_model = model.clone();
        }
        if let Some(model) = &cli.embed_model {
            self.config.embed_model = model.clone();
        }
        if let Some(k) = cli.top_k {
            self.config.top_k = k;
        }
        self.options = GenerationOptions {
            temperature: cli.temperature,
            max_tokens: cli.max_tokens,
        };
    }

    fn client(&self) -> OllamaClient {
        OllamaClient::new(&self.config.ollama_base_url)
    }

    fn rag_service(&self) -> Result<RagService<Embedder, OllamaClient>> {
        let client = self.client();
        let settings = RagSettings {
            chunking: self.config.chunking()?,
            top_k: self.config.top_k,
            options: self.options,
        };
        Ok(RagService::new(
            Embedder::new(client.clone(), &self.config.embed_model),
            client,
            settings,
        ))
    }

    fn open_store(&self) -> Result<IndexStore> {
        IndexStore::open(&self.config.db_path)
            .with_context(|| format!("opening index store {}", self.config.db_path))
    }

    async fn handle_lab(&mut self, technique: PromptTechnique, input: &str) -> Result<()> {
        let prompt = if input.trim().is_empty() {
            technique.default_prompt()
        } else {
            input
        };
        println!("{} {}", "Technique:".green(), technique.name());
        println!("{} {}", "Prompt:".green(), prompt);

        let lab = PromptLab::new(self.client(), self.options);
        let model = self.config.ollama_model.clone();
        let turn = lab.run(&mut self.session, technique, prompt, &model).await?;
        print_turn(&turn);
        Ok(())
    }

    async fn handle_chat(&mut self) -> Result<()> {
        let lab = PromptLab::new(self.client(), self.options);
        let model = self.config.ollama_model.clone();
        println!(
            "Chatting with {}. Type 'exit' to quit, '/clear' to forget the conversation.",
            model.bold()
        );
        loop {
            let input = read_line("You")?;
            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                break;
            }
            if input == "/clear" {
                self.session.clear_history();
                println!("{}", "Conversation cleared.".yellow());
                continue;
            }
            match lab.chat(&mut self.session, input, &model).await {
                Ok(turn) => print_turn(&turn),
                Err(err) => report_lab_error(&err),
            }
        }
        println!(
            "{}",
            format!("Session ended after {} turns.", self.session.history().len()).dimmed()
        );
        Ok(())
    }

    async fn handle_ingest(&mut self, args: &[String]) -> Result<()> {
        if args.is_empty() {
            bail!("pass at least one file or directory to ingest");
        }
        let inputs: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();
        let loader = DocumentLoader::new();
        let files = loader.collect_paths(&inputs)?;
        if files.is_empty() {
            bail!("no supported documents found (txt, md, pdf, docx)");
        }
        println!("Loading {} files...", files.len());
        let outcome = loader.load_paths(&files)?;

        let rag = self.rag_service()?;
        println!("Embedding with {}...", rag.embedder().model());
        let report = rag.ingest(&mut self.session, outcome.sources).await?;
        self.open_store()?
            .save(self.session.documents(), self.session.index())?;

        println!(
            "{}",
            format!(
                "Processed {} chunks from {} files",
                report.chunks, report.documents
            )
            .green()
        );
        if report.skipped_duplicates > 0 {
            println!(
                "{}",
                format!("Skipped {} duplicate files", report.skipped_duplicates).yellow()
            );
        }
        if !outcome.skipped.is_empty() {
            println!(
                "{}",
                format!("Skipped {} unreadable files:", outcome.skipped.len()).yellow()
            );
            for (path, err) in &outcome.skipped {
                println!("  {} ({})", path.display(), err);
            }
        }
        Ok(())
    }

    async fn handle_rag(&mut self, question: &str, technique: RagTechnique) -> Result<()> {
        if let Some((documents, index)) = self.open_store()?.load()? {
            self.session.replace_index(documents, index);
        }
        let rag = self.rag_service()?;
        let model = self.config.ollama_model.clone();

        if !question.trim().is_empty() {
            let turn = rag.ask(&mut self.session, question, technique, &model).await?;
            print_turn(&turn);
            return Ok(());
        }

        println!(
            "Asking {} documents with {} (top {} chunks). Type 'exit' to quit.",
            self.session.documents().len(),
            technique.name().bold(),
            rag.top_k()
        );
        loop {
            let question = read_line("Question")?;
            let question = question.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                break;
            }
            match rag.ask(&mut self.session, question, technique, &model).await {
                Ok(turn) => print_turn(&turn),
                Err(err) => report_lab_error(&err),
            }
        }
        Ok(())
    }

    async fn handle_models(&self) -> Result<()> {
        let client = self.client();
        let models = client.list_models().await?;
        println!("{} {}", "Models at".green(), client.base_url());
        if models.is_empty() {
            println!("{}", "No models pulled yet. Try `ollama pull llama3.2:3b`.".yellow());
            return Ok(());
        }
        for model in models {
            if model == self.config.ollama_model {
                println!("{} {}", model.green(), "(chat)".dimmed());
            } else if model == self.config.embed_model {
                println!("{} {}", model.green(), "(embeddings)".dimmed());
            } else {
                println!("{model}");
            }
        }
        Ok(())
    }

    fn handle_clear_index(&mut self) -> Result<()> {
        let prompt = format!("Delete the stored index in {}?", self.config.db_path);
        if !ask_confirmation(&prompt, false)? {
            println!("{}", "Nothing deleted.".yellow());
            return Ok(());
        }
        self.open_store()?.clear()?;
        self.session.clear_index();
        println!("{}", "Index cleared.".green());
        Ok(())
    }
}

fn read_line(prompt: &str) -> Result<String> {
    let line = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(line)
}
