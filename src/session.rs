//! The two-peer session controller.
//!
//! Splits both peer streams, reads complete lines, and feeds them to the
//! engine one at a time; each packet is handled to completion before the
//! `select!` is re-armed, so only one request is ever in flight and each
//! player's replies stay FIFO with its requests.
//!
//! Generic over `AsyncRead + AsyncWrite` so tests can drive a session
//! through `tokio::io::duplex` without touching the network.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::game::{Game, Phase, Seat, Step};
use crate::logger::Logger;
use crate::protocol::Reply;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Halts delivered; `Seat` took the game by shots, an opposing
    /// forfeit, or an opposing hangup.
    Winner(Seat),
    /// A peer vanished before PLAY; no halts are owed.
    Abandoned,
}

/// Arbitrate one full game between two connected peers.
pub async fn run<S>(peer1: S, peer2: S, log: &Logger) -> SessionEnd
where
    S: AsyncRead + AsyncWrite,
{
    let (r1, mut w1) = tokio::io::split(peer1);
    let (r2, mut w2) = tokio::io::split(peer2);
    let mut lines1 = BufReader::new(r1).lines();
    let mut lines2 = BufReader::new(r2).lines();

    let mut game = Game::new();

    loop {
        // next_line is cancellation-safe: if the other branch wins the
        // race, no partial line is lost from the buffered reader.
        let (line, seat) = tokio::select! {
            res = lines1.next_line() => match res {
                Ok(Some(line)) => (line, Seat::One),
                _ => return hangup(&mut game, Seat::One, &mut w1, &mut w2, log).await,
            },
            res = lines2.next_line() => match res {
                Ok(Some(line)) => (line, Seat::Two),
                _ => return hangup(&mut game, Seat::Two, &mut w1, &mut w2, log).await,
            },
        };

        let packet = line.trim();
        log.verbose(format_args!("{seat} → {packet}"));

        match game.handle(seat, packet) {
            Step::Ignored => {
                log.debug(format_args!("{seat} packet dropped (not their turn)"));
            }
            Step::Reply(reply) => {
                log.debug(format_args!("{seat} ← {reply}"));
                send(seat, &reply, &mut w1, &mut w2).await;
            }
            Step::Over { winner, last } => {
                if let Some(reply) = last {
                    log.debug(format_args!("{winner} ← {reply}"));
                    send(winner, &reply, &mut w1, &mut w2).await;
                }
                deliver_halts(winner, &mut w1, &mut w2).await;
                log.info(format_args!("game over, {winner} wins"));
                return SessionEnd::Winner(winner);
            }
        }
    }
}

/// A peer hung up.  Mid-game that is a forfeit and the survivor still
/// gets its halt; before PLAY the session just dissolves.
async fn hangup<W>(
    game: &mut Game,
    seat: Seat,
    w1: &mut W,
    w2: &mut W,
    log: &Logger,
) -> SessionEnd
where
    W: AsyncWrite + Unpin,
{
    log.info(format_args!("{seat} disconnected"));
    if game.phase() != Phase::Play {
        return SessionEnd::Abandoned;
    }
    let winner = game.forfeit(seat);
    deliver_halts(winner, w1, w2).await;
    log.info(format_args!("game over, {winner} wins by hangup"));
    SessionEnd::Winner(winner)
}

/// Both halts are written on every game end, in either order; the write
/// to an already-dead peer fails harmlessly.
async fn deliver_halts<W>(winner: Seat, w1: &mut W, w2: &mut W)
where
    W: AsyncWrite + Unpin,
{
    let halt1 = Reply::Halt { winner: winner == Seat::One };
    let halt2 = Reply::Halt { winner: winner == Seat::Two };
    send(Seat::One, &halt1, w1, w2).await;
    send(Seat::Two, &halt2, w1, w2).await;
}

async fn send<W>(seat: Seat, reply: &Reply, w1: &mut W, w2: &mut W)
where
    W: AsyncWrite + Unpin,
{
    let writer = if seat == Seat::One { w1 } else { w2 };
    // A failed write means the peer is gone; the read side notices.
    let _ = writer.write_all(format!("{reply}\n").as_bytes()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex};
    use tokio::task::JoinHandle;

    const FLEET: &str = "I 1 0 0 0 2 0 2 0 3 0 5 0 4 0 0 6 7 0 8 5";

    struct TestPeer {
        lines: tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl TestPeer {
        fn new(stream: DuplexStream) -> Self {
            let (reader, writer) = tokio::io::split(stream);
            Self {
                lines: BufReader::new(reader).lines(),
                writer,
            }
        }

        async fn say(&mut self, line: &str) {
            self.writer
                .write_all(format!("{line}\n").as_bytes())
                .await
                .unwrap();
        }

        async fn expect(&mut self, want: &str) {
            let got = self.lines.next_line().await.unwrap();
            assert_eq!(got.as_deref(), Some(want));
        }

        async fn expect_eof(&mut self) {
            assert_eq!(self.lines.next_line().await.unwrap(), None);
        }
    }

    fn spawn_session() -> (TestPeer, TestPeer, JoinHandle<SessionEnd>) {
        let (client1, server1) = duplex(4096);
        let (client2, server2) = duplex(4096);
        let handle = tokio::spawn(async move {
            let log = Logger::new(0);
            run(server1, server2, &log).await
        });
        (TestPeer::new(client1), TestPeer::new(client2), handle)
    }

    async fn play_opening(p1: &mut TestPeer, p2: &mut TestPeer) {
        p1.say("B 10 10").await;
        p1.expect("A").await;
        p2.say("B").await;
        p2.expect("A").await;
        p1.say(FLEET).await;
        p1.expect("A").await;
        p2.say(FLEET).await;
        p2.expect("A").await;
    }

    #[tokio::test]
    async fn clean_session_player_one_wins() {
        let (mut p1, mut p2, handle) = spawn_session();
        play_opening(&mut p1, &mut p2).await;

        let targets: Vec<(i32, i32)> = [
            (1u8, 0u8, 0i32, 0i32),
            (2, 0, 2, 0),
            (3, 0, 5, 0),
            (4, 0, 0, 6),
            (7, 0, 8, 5),
        ]
        .iter()
        .flat_map(|&(kind, rotation, row, col)| pieces::footprint(kind, rotation, row, col))
        .collect();
        let misses: Vec<(i32, i32)> = (0..10)
            .map(|col| (4, col))
            .chain((0..10).map(|col| (7, col)))
            .collect();

        for (i, &(row, col)) in targets.iter().enumerate() {
            p1.say(&format!("S {row} {col}")).await;
            let remaining = 5 - (i + 1) / 4;
            p1.expect(&format!("R {remaining} H")).await;
            if i + 1 < targets.len() {
                let (r, c) = misses[i];
                p2.say(&format!("S {r} {c}")).await;
                p2.expect("R 5 M").await;
            }
        }

        p1.expect("H 1").await;
        p2.expect("H 0").await;
        assert_eq!(handle.await.unwrap(), SessionEnd::Winner(Seat::One));
    }

    #[tokio::test]
    async fn wrong_phase_packet_draws_the_phase_error() {
        let (mut p1, _p2, _handle) = spawn_session();
        p1.say("S 0 0").await;
        p1.expect("E 100").await;
        p1.say("B 10 10").await;
        p1.expect("A").await;
    }

    #[tokio::test]
    async fn query_after_hit_reports_the_shot() {
        let (mut p1, mut p2, _handle) = spawn_session();
        play_opening(&mut p1, &mut p2).await;
        p1.say("S 0 0").await;
        p1.expect("R 5 H").await;
        p2.say("S 4 0").await;
        p2.expect("R 5 M").await;
        p1.say("Q").await;
        p1.expect("G 5 H 0 0").await;
    }

    #[tokio::test]
    async fn forfeit_halts_both_players() {
        let (mut p1, mut p2, handle) = spawn_session();
        play_opening(&mut p1, &mut p2).await;
        p1.say("F").await;
        p1.expect("H 0").await;
        p2.expect("H 1").await;
        assert_eq!(handle.await.unwrap(), SessionEnd::Winner(Seat::Two));
    }

    #[tokio::test]
    async fn hangup_during_play_is_a_forfeit() {
        let (mut p1, mut p2, handle) = spawn_session();
        play_opening(&mut p1, &mut p2).await;
        drop(p2);
        p1.expect("H 1").await;
        assert_eq!(handle.await.unwrap(), SessionEnd::Winner(Seat::One));
    }

    #[tokio::test]
    async fn hangup_before_play_abandons_without_halts() {
        let (mut p1, mut p2, handle) = spawn_session();
        p1.say("B 10 10").await;
        p1.expect("A").await;
        drop(p1);
        assert_eq!(handle.await.unwrap(), SessionEnd::Abandoned);
        p2.expect_eof().await;
    }
}
