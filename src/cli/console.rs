//! Interactive advisor console: reads questions line by line, prints the
//! structured answer with its metrics and appends it to the interaction log.

use colored::Colorize;
use log::warn;
use std::io::{ self, Write };
use tokio::io::{ AsyncBufRead, AsyncBufReadExt };

use crate::agent::{ AgentError, AskOutcome, Session };
use crate::history::format_history_for_display;
use crate::metrics::{ InteractionLog, InteractionMetrics, MetricsTracker };
use crate::models::response::StructuredResponse;

pub const EXIT_WORDS: [&str; 5] = ["salir", "exit", "quit", "chau", "adios"];
const RESET_COMMAND: &str = "/reset";
const HISTORY_COMMAND: &str = "/history";

fn banner(name: &str) -> String {
    let title = format!("  {}  ", name.to_uppercase());
    let rule = "=".repeat(title.chars().count());
    format!("{}\n{}\n{}", rule, title, rule)
}

pub fn is_exit_word(line: &str) -> bool {
    let lowered = line.trim().to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

pub struct Console {
    session: Session,
    tracker: MetricsTracker,
    log: InteractionLog,
}

impl Console {
    pub fn new(session: Session, log: InteractionLog) -> Self {
        Self { session, tracker: MetricsTracker::new(), log }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs until an exit word or end of input.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
        where R: AsyncBufRead + Unpin, W: Write
    {
        let name = self.session.persona().name.clone();
        writeln!(out, "{}\n", banner(&name).magenta().bold())?;
        writeln!(out, "{} Hi! I'm {}. How can I help you today?", format!("{}:", name).cyan(), name)?;
        writeln!(
            out,
            "{}",
            format!(
                "   (type '{}' or '{}' to leave, {} to start over, {} to review the conversation)\n",
                EXIT_WORDS[0],
                EXIT_WORDS[1],
                RESET_COMMAND,
                HISTORY_COMMAND
            ).dimmed()
        )?;

        let mut lines = input.lines();
        loop {
            write!(out, "{} ", "➜".green())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            let line = line.trim();

            if is_exit_word(line) {
                writeln!(out, "{}", "See you soon! 👋".green().bold())?;
                break;
            }
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case(RESET_COMMAND) {
                self.session.reset();
                writeln!(out, "{}", "Conversation cleared.".dimmed())?;
                continue;
            }
            if line.eq_ignore_ascii_case(HISTORY_COMMAND) {
                write!(out, "{}", format_history_for_display(&self.session.history()))?;
                continue;
            }

            self.handle_question(&name, line, out).await?;
        }
        Ok(())
    }

    async fn handle_question<W: Write>(&mut self, name: &str, question: &str, out: &mut W) -> io::Result<()> {
        self.tracker.start();
        let outcome = self.session.ask(question).await;
        self.tracker.stop();

        match outcome {
            Ok(AskOutcome::Answered(response)) => {
                let metrics = self.tracker.measure(question, &response);
                write!(out, "{}", render_answer(name, &response, &metrics))?;
                if let Err(e) = self.log.append(question, &response, &metrics) {
                    warn!("Could not record interaction: {}", e);
                    writeln!(out, "{}", format!("(interaction not logged: {})", e).yellow())?;
                }
            }
            Ok(AskOutcome::Rejected(verdict)) => {
                writeln!(out, "{}", format!("🚫 SECURITY ALERT: {}", verdict.reason).red())?;
            }
            Err(AgentError::SchemaViolation(violation)) => {
                writeln!(out, "{}", "\n⚠️  Hallucination alert:".red())?;
                writeln!(out, "{}", "The model tried to use a category that is not allowed.".yellow())?;
                writeln!(out, "Please try rephrasing your question.\n")?;
                writeln!(out, "{}", violation.to_string().red())?;
            }
            Err(AgentError::Provider(e)) => {
                writeln!(out, "{}", format!("💥 Unexpected error: {}", e).red())?;
            }
        }
        Ok(())
    }
}

pub fn render_answer(name: &str, response: &StructuredResponse, metrics: &InteractionMetrics) -> String {
    let mut text = String::new();
    text.push_str(&format!("\n{} {}\n", format!("{}:", name).cyan(), response.answer));
    text.push_str(
        &format!(
            "\n{}\n",
            format!(
                "👀 (Confidence: {:.0}% | Intent: {})",
                response.confidence_score * 100.0,
                response.intent
            ).dimmed()
        )
    );
    if let Some(reasoning) = &response.reasoning {
        text.push_str(&format!("{}\n", format!("💭 {}", reasoning).dimmed()));
    }
    if !response.recommended_actions.is_empty() {
        let actions = response.recommended_actions
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\n{}\n", format!("⚡ Suggested actions: [{}]", actions).magenta().bold()));
    }

    text.push_str(&format!("{}\n", "\n--- 📊 Query metrics ---".cyan().bold()));
    text.push_str(&format!("⏱️  Latency: {} ms\n", metrics.latency_ms));
    text.push_str(&format!("💰 Est. cost: ${:.6}\n", metrics.cost_usd));
    text.push_str(
        &format!(
            "🧮 Tokens: {} (In: {} / Out: {})\n",
            metrics.total_tokens,
            metrics.input_tokens,
            metrics.output_tokens
        )
    );
    text.push_str(&format!("{}\n\n", "------------------------".cyan().bold()));
    text
}
