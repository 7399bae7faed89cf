use std::io::{self, BufRead, Write};

const QUESTION: &str = "Would you like a summary of each article? (Y/N): ";
const INVALID: &str = "Invalid input. Please type 'Y' for yes or 'N' for no.";

/// Ask on the terminal whether articles should be summarized.
pub fn ask_summaries() -> io::Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ask_yes_no(&mut stdin.lock(), &mut stdout)
}

/// Re-asks until the answer is `y` or `n` (any case). Running out of input is an error.
fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<bool> {
    loop {
        write!(out, "{}", QUESTION)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }

        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(out, "{}", INVALID)?,
        }
    }
}
