use clap::{ArgAction, Parser};
use std::fmt;
use std::net::SocketAddr;
use tetraship::game::Seat;
use tetraship::logger::Logger;
use tetraship::session::{self, SessionEnd};
use tokio::net::{TcpListener, TcpStream};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name    = "server",
    version,
    about   = "Tetraship — battleship with tetromino ships, dedicated server",
    long_about = "Arbitrates one two-player game of tetromino battleship.\n\
                  Player 1 is the first connection on the first port, Player 2\n\
                  the first connection on the second.  Protocol is line-delimited\n\
                  ASCII; see src/protocol.rs for the full grammar."
)]
struct Args {
    /// Address to bind both listeners on
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Port accepting Player 1
    #[arg(long, default_value_t = 2201)]
    port1: u16,

    /// Port accepting Player 2
    #[arg(long, default_value_t = 2202)]
    port2: u16,

    /// Increase output verbosity (-v verbose, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

// ── DISPLAY EVENTS ────────────────────────────────────────────────────────────
//
// Every loggable occurrence is an `Event` variant.  Implementing `Display`
// here means the logger receives a rich, human-readable message while still
// using Rust's zero-cost formatting machinery (no allocation until a variant
// is actually emitted at the current verbosity level).

enum Event {
    Listening { seat: Seat, addr: String },
    Waiting { seat: Seat },
    PlayerConnected { seat: Seat, addr: SocketAddr },
    GameStarted,
    GameWon { seat: Seat },
    Abandoned,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Listening { seat, addr } =>
                write!(f, "Listening for {seat} on {addr}"),
            Event::Waiting { seat } =>
                write!(f, "Waiting for {seat} to connect"),
            Event::PlayerConnected { seat, addr } =>
                write!(f, "{seat} connected from {addr}"),
            Event::GameStarted =>
                write!(f, "Both players connected, game started"),
            Event::GameWon { seat } =>
                write!(f, "Session over: {seat} wins"),
            Event::Abandoned =>
                write!(f, "Session abandoned before play began"),
        }
    }
}

// ── SOCKET SETUP ──────────────────────────────────────────────────────────────

async fn bind(addr: &str) -> TcpListener {
    TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to bind to {addr}: {e}");
        std::process::exit(1);
    })
}

async fn accept(listener: &TcpListener, seat: Seat, log: &Logger) -> (TcpStream, SocketAddr) {
    log.verbose(Event::Waiting { seat });
    match listener.accept().await {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Accept failed for {seat}: {e}");
            std::process::exit(1);
        }
    }
}

// ── ENTRY POINT ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let log = Logger::new(args.verbose);

    let addr1 = format!("{}:{}", args.bind, args.port1);
    let addr2 = format!("{}:{}", args.bind, args.port2);

    // Both listeners come up before either accept, so the players may
    // connect in any order at the TCP level.
    let listener1 = bind(&addr1).await;
    let listener2 = bind(&addr2).await;
    log.info(Event::Listening { seat: Seat::One, addr: addr1 });
    log.info(Event::Listening { seat: Seat::Two, addr: addr2 });

    let (stream1, peer1) = accept(&listener1, Seat::One, &log).await;
    log.info(Event::PlayerConnected { seat: Seat::One, addr: peer1 });
    let (stream2, peer2) = accept(&listener2, Seat::Two, &log).await;
    log.info(Event::PlayerConnected { seat: Seat::Two, addr: peer2 });

    log.info(Event::GameStarted);
    match session::run(stream1, stream2, &log).await {
        SessionEnd::Winner(seat) => log.info(Event::GameWon { seat }),
        SessionEnd::Abandoned => log.info(Event::Abandoned),
    }
}
