use clap::{ArgAction, Parser};
use std::fmt;
use std::io::{self, Write as _};
use tetraship::logger::Logger;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name    = "client",
    version,
    about   = "Tetraship — battleship with tetromino ships, terminal client",
    long_about = "Connects to a running tetraship server and plays interactively.\n\
                  Player 1 connects to port 2201, Player 2 to port 2202.\n\
                  Commands:\n  \
                    begin [w h]                      (w h for Player 1 only)\n  \
                    init <t r row col> ×5            place the five ships\n  \
                    shoot <row> <col>\n  \
                    query\n  \
                    forfeit"
)]
struct Args {
    /// Server address to connect to
    #[arg(default_value = "127.0.0.1:2201")]
    addr: String,

    /// Increase output verbosity (-v verbose, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

// ── CLIENT EVENTS (operational logging to stderr) ─────────────────────────────

enum ClientEvent<'a> {
    Connecting { addr: &'a str },
    Connected { addr: &'a str },
    Sending { cmd: &'a str },
    Received { raw: &'a str },
    Disconnected,
}

impl fmt::Display for ClientEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::Connecting { addr } => write!(f, "Connecting to {addr}…"),
            ClientEvent::Connected { addr } => write!(f, "Connected to {addr}"),
            ClientEvent::Sending { cmd } => write!(f, "→ {cmd}"),
            ClientEvent::Received { raw } => write!(f, "← {raw}"),
            ClientEvent::Disconnected => write!(f, "Connection closed by server"),
        }
    }
}

// ── SHOT HISTORY ──────────────────────────────────────────────────────────────

struct ShotLog {
    opponent_ships: u8,
    shots: Vec<(bool, i32, i32)>,
}

impl ShotLog {
    /// Parse the payload after `G `.
    fn parse(rest: &str) -> Option<Self> {
        let mut t = rest.split_whitespace();
        let opponent_ships = t.next()?.parse().ok()?;
        let mut shots = Vec::new();
        while let Some(mark) = t.next() {
            let hit = match mark {
                "H" => true,
                "M" => false,
                _ => return None,
            };
            let row = t.next()?.parse().ok()?;
            let col = t.next()?.parse().ok()?;
            shots.push((hit, row, col));
        }
        Some(Self { opponent_ships, shots })
    }
}

impl fmt::Display for ShotLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Opponent has {} ship(s) afloat.", self.opponent_ships)?;
        if self.shots.is_empty() {
            return write!(f, "  (no shots taken yet)");
        }
        for (hit, row, col) in &self.shots {
            let mark = if *hit { "hit " } else { "miss" };
            writeln!(f, "  {mark} at ({row}, {col})")?;
        }
        Ok(())
    }
}

// ── SERVER MESSAGES ───────────────────────────────────────────────────────────

enum ServerMsg {
    Ack,
    Rejected { code: u16 },
    ShotResult { opponent_ships: u8, hit: bool },
    History(ShotLog),
    Halt { won: bool },
    Unknown(String),
}

impl ServerMsg {
    fn parse(line: &str) -> Self {
        if line == "A" {
            return Self::Ack;
        }
        if let Some(rest) = line.strip_prefix("E ") {
            if let Ok(code) = rest.trim().parse::<u16>() {
                return Self::Rejected { code };
            }
        }
        if let Some(rest) = line.strip_prefix("R ") {
            let mut t = rest.split_whitespace();
            if let (Some(Ok(ships)), Some(mark)) = (t.next().map(str::parse::<u8>), t.next()) {
                match mark {
                    "H" => return Self::ShotResult { opponent_ships: ships, hit: true },
                    "M" => return Self::ShotResult { opponent_ships: ships, hit: false },
                    _ => {}
                }
            }
        }
        if let Some(rest) = line.strip_prefix("G") {
            if let Some(log) = ShotLog::parse(rest) {
                return Self::History(log);
            }
        }
        if let Some(rest) = line.strip_prefix("H ") {
            match rest.trim() {
                "1" => return Self::Halt { won: true },
                "0" => return Self::Halt { won: false },
                _ => {}
            }
        }
        Self::Unknown(line.to_string())
    }
}

/// Each server message knows how to display itself to the player.
impl fmt::Display for ServerMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMsg::Ack =>
                write!(f, "Accepted."),
            ServerMsg::Rejected { code } =>
                write!(f, "Rejected: E {code} ({})", explain(*code)),
            ServerMsg::ShotResult { opponent_ships, hit: true } =>
                write!(f, "Hit!  Opponent has {opponent_ships} ship(s) afloat."),
            ServerMsg::ShotResult { opponent_ships, hit: false } =>
                write!(f, "Miss.  Opponent has {opponent_ships} ship(s) afloat."),
            ServerMsg::History(log) =>
                write!(f, "{log}"),
            ServerMsg::Halt { won: true } =>
                write!(f, "You win!"),
            ServerMsg::Halt { won: false } =>
                write!(f, "You lose."),
            ServerMsg::Unknown(raw) =>
                write!(f, "(unknown message: {raw:?})"),
        }
    }
}

fn explain(code: u16) -> &'static str {
    match code {
        100 => "expected a Begin packet",
        101 => "expected an Initialize packet",
        102 => "expected Shoot, Query, or Forfeit",
        200 => "malformed Begin",
        201 => "malformed Initialize",
        202 => "malformed Shoot",
        300 => "invalid piece type",
        301 => "invalid rotation",
        302 => "ship out of bounds",
        303 => "ships overlap",
        400 => "shot outside the board",
        401 => "cell already targeted",
        _ => "unknown code",
    }
}

// ── USER INPUT ────────────────────────────────────────────────────────────────

/// A validated command ready to be sent over the wire.
enum Cmd {
    Begin { size: Option<(i32, i32)> },
    Init { params: Vec<i32> },
    Shoot { row: i32, col: i32 },
    Query,
    Forfeit,
}

impl Cmd {
    /// Parse a line typed by the player.  Keywords are case-insensitive
    /// and the bare wire letters work too.
    fn parse(raw: &str) -> Result<Self, String> {
        let mut t = raw.split_whitespace();
        match t.next().unwrap_or("").to_ascii_uppercase().as_str() {
            "BEGIN" | "B" => {
                let rest: Vec<&str> = t.collect();
                match rest.len() {
                    0 => Ok(Self::Begin { size: None }),
                    2 => {
                        let w = parse_i32(rest[0], "width")?;
                        let h = parse_i32(rest[1], "height")?;
                        Ok(Self::Begin { size: Some((w, h)) })
                    }
                    _ => Err("begin takes no arguments (Player 2) or <w> <h> (Player 1)".into()),
                }
            }
            "INIT" | "I" => {
                let params = t
                    .map(|tok| parse_i32(tok, "ship parameter"))
                    .collect::<Result<Vec<_>, _>>()?;
                if params.len() != 20 {
                    return Err(format!(
                        "init needs 20 numbers (5 × type rotation row col), got {}",
                        params.len()
                    ));
                }
                Ok(Self::Init { params })
            }
            "SHOOT" | "S" => {
                let row = parse_i32(t.next().ok_or("missing row")?, "row")?;
                let col = parse_i32(t.next().ok_or("missing col")?, "col")?;
                Ok(Self::Shoot { row, col })
            }
            "QUERY" | "Q" => Ok(Self::Query),
            "FORFEIT" | "F" => Ok(Self::Forfeit),
            "" => Err("empty input".into()),
            kw => Err(format!("unknown command '{kw}'")),
        }
    }

    /// Serialise to the wire format expected by the server.
    fn to_wire(&self) -> String {
        match self {
            Self::Begin { size: Some((w, h)) } => format!("B {w} {h}\n"),
            Self::Begin { size: None } => "B\n".to_string(),
            Self::Init { params } => {
                let body: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                format!("I {}\n", body.join(" "))
            }
            Self::Shoot { row, col } => format!("S {row} {col}\n"),
            Self::Query => "Q\n".to_string(),
            Self::Forfeit => "F\n".to_string(),
        }
    }
}

fn parse_i32(token: &str, name: &str) -> Result<i32, String> {
    token
        .parse::<i32>()
        .map_err(|_| format!("{name} must be a whole number"))
}

// ── PROMPT ────────────────────────────────────────────────────────────────────

fn print_prompt() {
    print!("> ");
    io::stdout().flush().ok();
}

fn print_help() {
    println!("  Commands:");
    println!("    begin [w h]            — start; width and height for Player 1 only");
    println!("    init <t r row col> ×5  — place the five tetromino ships");
    println!("    shoot <row> <col>      — fire at the opponent");
    println!("    query                  — list your shots so far");
    println!("    forfeit                — concede the game");
    println!("  Out-of-turn shoot/query is silently ignored by the server.");
}

// ── MAIN ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let log = Logger::new(args.verbose);

    log.info(ClientEvent::Connecting { addr: &args.addr });

    let stream = match TcpStream::connect(&args.addr).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {e}", args.addr);
            std::process::exit(1);
        }
    };

    log.info(ClientEvent::Connected { addr: &args.addr });
    print_help();
    print_prompt();

    let (reader, mut writer) = tokio::io::split(stream);
    let mut server_lines = BufReader::new(reader).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            // ── Server → Client ───────────────────────────────────────────────
            result = server_lines.next_line() => {
                let raw = match result {
                    Ok(Some(l)) => l,
                    _ => {
                        log.info(ClientEvent::Disconnected);
                        println!("\nDisconnected from server.");
                        break;
                    }
                };

                log.trace(ClientEvent::Received { raw: &raw });

                let msg = ServerMsg::parse(raw.trim());
                println!("\n{msg}");
                if let ServerMsg::Halt { .. } = msg {
                    break;
                }
                print_prompt();
            }

            // ── Stdin → Server ────────────────────────────────────────────────
            result = stdin_lines.next_line() => {
                let raw = match result {
                    Ok(Some(l)) => l,
                    _ => {
                        println!("\nInput closed.");
                        break;
                    }
                };

                let trimmed = raw.trim();

                if trimmed.is_empty() {
                    print_prompt();
                    continue;
                }

                if matches!(trimmed.to_ascii_uppercase().as_str(), "HELP" | "?") {
                    print_help();
                    print_prompt();
                    continue;
                }

                match Cmd::parse(trimmed) {
                    Ok(cmd) => {
                        let wire = cmd.to_wire();
                        log.verbose(ClientEvent::Sending { cmd: wire.trim_end() });
                        if writer.write_all(wire.as_bytes()).await.is_err() {
                            eprintln!("Failed to send command.");
                            break;
                        }
                    }
                    Err(reason) => {
                        println!("  ? {reason}");
                        print_help();
                        print_prompt();
                    }
                }
            }
        }
    }
}
