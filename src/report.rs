use hypertape::{RunReport, SearchOutcome, Session, summarize};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
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
    }
}

pub fn print_run(source: &str, session: &Session, color: bool) {
    let palette = ansi::Palette::new(color);
    let report = summarize(session);

    println!("\n{}", palette.bold(palette.paint(format!("⚙  Searching: {source}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tapes ━━━", ansi::GRAY));
    if report.words.is_empty() {
        println!("{}", palette.dim("  No tapes"));
    }
    for (idx, word) in report.words.iter().enumerate() {
        let shown = if word.is_empty() { palette.dim("(empty)") } else { palette.paint(word, ansi::YELLOW) };
        println!("  {} {}", palette.paint(format!("[{idx}]"), ansi::GRAY), shown);
    }

    println!("\n{}", palette.paint("━━━ Witness ━━━", ansi::GRAY));
    print_witness(&report, &palette);

    if let Some(metrics) = session.metrics().filter(|m| !m.layers.is_empty()) {
        println!("\n{}", palette.paint("━━━ Search ━━━", ansi::GRAY));
        for layer in &metrics.layers {
            println!(
                "  {} {}  {} {}",
                palette.paint(format!("Depth {}:", layer.depth), ansi::BLUE),
                palette.paint(format!("{} expanded", layer.expanded), ansi::CYAN),
                if layer.discovered > 0 {
                    palette.paint(format!("✓ {} new", layer.discovered), ansi::GREEN)
                } else {
                    palette.dim("✗ 0 new")
                },
                palette.dim(format!("{:?}", layer.duration)),
            );
        }
        println!(
            "  {} {}  {} {}  {} {}",
            palette.dim("visited:"),
            palette.paint(metrics.visited.to_string(), ansi::YELLOW),
            palette.dim("duplicates:"),
            palette.paint(metrics.duplicates.to_string(), ansi::YELLOW),
            palette.dim("peak frontier:"),
            palette.paint(metrics.peak_frontier.to_string(), ansi::YELLOW),
        );
    }

    println!("\n{}", palette.paint("━━━ Verdict ━━━", ansi::GRAY));
    println!("  {}", verdict(&report, &palette));

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Search: {}  │  Step: {}/{}",
        palette.paint(format!("{:?}", report.elapsed), ansi::GREEN),
        session.current_step(),
        report.history.len(),
    );
    println!();
}

fn print_witness(report: &RunReport, palette: &ansi::Palette) {
    if report.history.is_empty() {
        println!("{}", palette.dim("  No history"));
        return;
    }
    for (step, row) in report.history.iter().enumerate() {
        let cursors: Vec<String> = row
            .positions
            .iter()
            .zip(&report.words)
            .map(|(&p, word)| {
                let (read, rest) = word.split_at(word.char_indices().nth(p).map_or(word.len(), |(i, _)| i));
                format!("{}{}{}", palette.dim(read), palette.paint("▸", ansi::CYAN), rest)
            })
            .collect();
        println!(
            "  {} {} {} {}",
            palette.paint(format!("{step:>3}"), ansi::GRAY),
            palette.bold(palette.paint(&row.state, ansi::BLUE)),
            palette.dim("│"),
            cursors.join("  "),
        );
    }
}

fn verdict(report: &RunReport, palette: &ansi::Palette) -> String {
    match (report.outcome, report.accepted) {
        (_, true) => palette.bold(palette.paint("✓ accepted", ansi::GREEN)),
        (Some(SearchOutcome::Truncated), false) => {
            palette.paint("? undecided (expansion budget reached)", ansi::YELLOW)
        }
        (Some(SearchOutcome::Exhausted), false) => palette.paint("✗ rejected (search space exhausted)", ansi::RED),
        (_, false) => palette.paint("✗ not accepted", ansi::RED),
    }
}
