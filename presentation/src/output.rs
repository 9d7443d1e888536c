use colored::Colorize;
use domain::session::{ConversationTurn, SourceExcerpt};
use domain::technique::{PromptTechnique, RagTechnique};
use domain::LabError;
use shared::telemetry::format_latency;

pub fn print_turn(turn: &ConversationTurn) {
    println!("\n{}", turn.answer.trim());
    println!(
        "{}",
        format!("{} · {}", turn.model, format_latency(turn.latency)).dimmed()
    );
    if !turn.sources.is_empty() {
        println!("\n{}", "Sources:".green().bold());
        print!("{}", format_sources(&turn.sources));
    }
}

pub fn format_sources(sources: &[SourceExcerpt]) -> String {
    let mut out = String::new();
    for (i, source) in sources.iter().enumerate() {
        out.push_str(&format!(
            "[{}] {} (score {:.3})\n",
            i + 1,
            source.source,
            source.score
        ));
        for line in source.excerpt.lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}

pub fn print_techniques() {
    println!("{}", "Prompt techniques".green().bold());
    for technique in PromptTechnique::ALL {
        println!(
            "  {} {}",
            technique.name().bold(),
            format!("({})", technique.slug()).blue()
        );
        println!("    {}", technique.description());
        for example in technique.examples() {
            let first = example.lines().next().unwrap_or_default();
            println!("    {} {}", "e.g.".dimmed(), first.dimmed());
        }
    }
    println!("\n{}", "RAG techniques".green().bold());
    for technique in RagTechnique::ALL {
        println!(
            "  {} {}",
            technique.name().bold(),
            format!("({})", technique.slug()).blue()
        );
    }
}

/// Print an error with its kind and a remediation hint when it is a lab error.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<LabError>() {
        Some(lab) => report_lab_error(lab),
        None => eprintln!("{} {err:#}", "error:".red().bold()),
    }
}

pub fn report_lab_error(err: &LabError) {
    eprintln!("{} [{}] {}", "error:".red().bold(), err.kind(), err);
    eprintln!("  {} {}", "hint:".yellow(), err.hint());
}
