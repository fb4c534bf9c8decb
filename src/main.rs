fn main() {
    println!("Tetraship - Battleship with Tetromino Ships");
    println!();
    println!("Usage:");
    println!("  Start the server:    cargo run --bin server");
    println!("  Connect Player 1:    cargo run --bin client 127.0.0.1:2201");
    println!("  Connect Player 2:    cargo run --bin client 127.0.0.1:2202");
    println!();
    println!("The server accepts Player 1 on port 2201 and Player 2 on port 2202.");
    println!("Player 1 picks the board size and moves first.");
}
