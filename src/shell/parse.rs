use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "open" => args.first().map(|&name| Command::Open(name.to_string())),
        "put" => args.first().map(|&path| Command::Put(path.to_string())),
        "get" => args.first().map(|&name| Command::Get(name.to_string())),
        "rm" => args.first().map(|&name| Command::Rm(name.to_string())),
        "dir" => Some(Command::Dir),
        "putr" => args
            .first()
            .map(|&name| Command::Putr(name.to_string(), args[1..].join(" "))),
        "df" => Some(Command::Df),
        "kill" => Some(Command::Kill),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}
