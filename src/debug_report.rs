use billdiff::classify::Verdict;
use billdiff::{BillOutcome, ClassifyDetails, WalkMetrics, WalkOutput};

pub use ansi::ColorChoice;
use ansi::Stream;

mod ansi {
    use std::io::{self, IsTerminal};

    const RESET: &str = "\x1b[0m";
    const DIM: &str = "\x1b[2m";
    const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    /// `--color` / `--no-color`, or neither.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ColorChoice {
        Always,
        Never,
        Auto,
    }

    /// Where a report is written. `Auto` colors only a terminal.
    #[derive(Debug, Clone, Copy)]
    pub enum Stream {
        Stdout,
        Stderr,
    }

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(choice: ColorChoice, stream: Stream) -> Self {
            let enabled = match (choice, stream) {
                (ColorChoice::Always, _) => true,
                (ColorChoice::Never, _) => false,
                (ColorChoice::Auto, Stream::Stdout) => io::stdout().is_terminal(),
                (ColorChoice::Auto, Stream::Stderr) => io::stderr().is_terminal(),
            };
            Self { enabled }
        }

        fn wrap(&self, s: &str, code: &str) -> String {
            if self.enabled { format!("{code}{s}{RESET}") } else { s.to_string() }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            self.wrap(s.as_ref(), color)
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            self.wrap(s.as_ref(), BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.wrap(s.as_ref(), DIM)
        }

        /// A counter that only stands out when it is not zero.
        pub fn count(&self, n: usize, color: &str) -> String {
            if n > 0 { self.paint(n.to_string(), color) } else { self.dim("0") }
        }
    }
}

pub fn print_classify(details: &ClassifyDetails, color: ColorChoice) {
    let palette = ansi::Palette::new(color, Stream::Stdout);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Classifying: \"{}\"", details.text.trim()), ansi::CYAN)));
    if details.normalized != details.text.trim() {
        println!("  {} {}", palette.dim("normalized:"), details.normalized);
    }

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    println!("  {} {}", palette.dim("cues:"), palette.paint(format!("{:?}", details.cues), ansi::BLUE));
    print_rules(details, &palette);

    println!("\n{}", palette.paint("━━━ Actions ━━━", ansi::GRAY));
    if details.actions.is_empty() {
        println!("{}", palette.dim("  No rule matched"));
    }
    for (kind, fields) in &details.actions {
        println!("  {}", palette.bold(palette.paint(kind.as_str(), ansi::GREEN)));
        for (name, value) in fields {
            println!("      {} {}", palette.dim(format!("{name}:")), palette.paint(format!("\"{value}\""), ansi::YELLOW));
        }
    }

    println!("\n{}", palette.paint("━━━ Citations ━━━", ansi::GRAY));
    if details.citations.is_empty() {
        println!("{}", palette.dim("  None (a clause without citation inherits its ancestor's)"));
    }
    for citation in &details.citations {
        let status = if citation.complete {
            palette.paint("complete", ansi::GREEN)
        } else {
            palette.paint("partial", ansi::YELLOW)
        };
        println!(
            "  {} {} {}",
            palette.paint(&citation.path, ansi::CYAN),
            palette.dim("│"),
            status
        );
        println!("      {} {}", palette.dim("from:"), palette.dim(&citation.raw_text));
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", details.elapsed), ansi::GREEN));
    println!();
}

fn print_rules(details: &ClassifyDetails, palette: &ansi::Palette) {
    let gated = details.rules.iter().filter(|t| t.verdict == Verdict::Gated).count();
    for trace in details.rules.iter().filter(|t| t.verdict != Verdict::Gated) {
        let verdict = match trace.verdict {
            Verdict::Matched => palette.paint("✓ matched", ansi::GREEN),
            Verdict::Missed => palette.dim("✗ missed"),
            Verdict::NotTried => palette.dim("· not tried"),
            Verdict::Gated => continue,
        };
        println!(
            "  {} {} {}",
            palette.paint(format!("{:<20}", trace.kind.as_str()), ansi::BLUE),
            palette.paint(format!("{:<40}", trace.name), ansi::CYAN),
            verdict
        );
    }
    if gated > 0 {
        println!("  {}", palette.dim(format!("... +{gated} rules skipped by cues")));
    }
}

pub fn print_walk(name: &str, out: &WalkOutput, color: ColorChoice) {
    let palette = ansi::Palette::new(color, Stream::Stdout);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Bill: {name}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Clauses ━━━", ansi::GRAY));
    if out.records.is_empty() {
        println!("{}", palette.dim("  No clause matched any rule"));
    }
    for (idx, record) in out.records.iter().enumerate() {
        let kinds: Vec<&str> = record.actions.keys().map(|k| k.as_str()).collect();
        let target = record.citations.first().map(|c| c.path.as_str()).unwrap_or("-");
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.bold(palette.paint(kinds.join(", "), ansi::GREEN)),
            palette.dim("│"),
            palette.paint(target, ansi::YELLOW),
        );
    }

    println!("\n{}", palette.paint("━━━ Diffs ━━━", ansi::GRAY));
    for diff in &out.diffs {
        let mut fields = Vec::new();
        if diff.heading.is_some() {
            fields.push("heading");
        }
        if diff.body_text.is_some() {
            fields.push("body");
        }
        if diff.display_label.is_some() {
            fields.push("label");
        }
        println!(
            "  {} {} {}",
            palette.paint(format!("node {}", diff.target_node_id), ansi::BLUE),
            palette.dim("│"),
            palette.paint(fields.join(", "), ansi::CYAN)
        );
    }
    for node in &out.inserted {
        println!("  {} {}", palette.paint("+", ansi::GREEN), palette.paint(&node.citation_path, ansi::GREEN));
    }

    println!("\n{}", palette.paint("━━━ Metrics ━━━", ansi::GRAY));
    print_metrics(&out.metrics, &palette);
    println!();
}

fn print_metrics(m: &WalkMetrics, palette: &ansi::Palette) {
    println!(
        "  Visited: {}  │  Classified: {}  │  Quoted blocks: {}",
        palette.paint(m.nodes_visited.to_string(), ansi::BLUE),
        palette.paint(m.clauses_classified.to_string(), ansi::BLUE),
        palette.dim(m.quoted_blocks_skipped.to_string()),
    );
    println!(
        "  Dispatched: {}  │  Failed: {}  │  Unresolved: {}",
        palette.paint(m.actions_dispatched.to_string(), ansi::GREEN),
        palette.count(m.actions_failed, ansi::RED),
        palette.count(m.unresolved, ansi::YELLOW),
    );
    println!(
        "  Diffs: {}  │  Inserted: {}  │  Total: {}",
        palette.paint(m.diffs_emitted.to_string(), ansi::GREEN),
        palette.paint(m.nodes_inserted.to_string(), ansi::GREEN),
        palette.dim(format!("{:?}", m.total)),
    );
}

/// Batch summary. Goes to stderr; stdout carries the JSON lines.
pub fn print_batch(outcomes: &[BillOutcome], color: ColorChoice) {
    let palette = ansi::Palette::new(color, Stream::Stderr);
    let mut total = WalkMetrics::default();

    for outcome in outcomes {
        match &outcome.result {
            Ok(out) => {
                total.absorb(&out.metrics);
                eprintln!(
                    "  {} {} {}",
                    palette.paint("✓", ansi::GREEN),
                    outcome.name,
                    palette.dim(format!("v{}, {} diffs", outcome.version_id, out.diffs.len()))
                );
            }
            Err(err) => eprintln!("  {} {} {}", palette.paint("✗", ansi::RED), outcome.name, palette.paint(err.to_string(), ansi::RED)),
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    eprintln!(
        "\n  Bills: {}  │  Failed: {}  │  Diffs: {}  │  Walk time: {}",
        palette.paint(outcomes.len().to_string(), ansi::BLUE),
        palette.count(failed, ansi::RED),
        palette.paint(total.diffs_emitted.to_string(), ansi::GREEN),
        palette.dim(format!("{:?}", total.total)),
    );
}
