use lcd1602_gpio::lcd::hd44780::LcdCommand;
use thiserror::Error;
use crate::config::PinsConfig;

/// One line of user input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// Text to show, with its line terminator.
    Text(String),
    Command(LcdCommand),
    Read,
    State,
    Quit,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseInputError {
    #[error("unknown command :{0}")]
    UnknownCommand(String),
    #[error(":{command} expects {expected} argument(s)")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
    },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

impl Input {
    /// Parses a line read from stdin, without its terminator.
    ///
    /// Lines starting with `:` are commands, anything else is text. `::` escapes a leading colon.
    /// Pin numbers given to `:init` are shifted by `line_offset`.
    pub fn parse(line: &str, line_offset: usize) -> Result<Input, ParseInputError> {
        let Some(command_line) = line.strip_prefix(':') else {
            return Ok(Input::Text(format!("{}\n", line)));
        };
        if command_line.starts_with(':') {
            return Ok(Input::Text(format!("{}\n", command_line)));
        }

        let mut words = command_line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args = words
            .map(|word| {
                word.parse::<i32>()
                    .map_err(|_| ParseInputError::InvalidNumber(word.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let input = match name {
            "clear" => {
                expect_args("clear", &args, 0)?;
                Input::Command(LcdCommand::Clear)
            }
            "line1" => Input::Command(LcdCommand::SetLine1(single_arg("line1", &args)?)),
            "line2" => Input::Command(LcdCommand::SetLine2(single_arg("line2", &args)?)),
            "left" => Input::Command(LcdCommand::ScrollLeft(single_arg("left", &args)?)),
            "right" => Input::Command(LcdCommand::ScrollRight(single_arg("right", &args)?)),
            "init" => {
                expect_args("init", &args, 6)?;
                let pins = args
                    .iter()
                    .map(|&pin| {
                        usize::try_from(pin)
                            .map_err(|_| ParseInputError::InvalidNumber(pin.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let pins = PinsConfig {
                    rs: pins[0],
                    e: pins[1],
                    data: [pins[2], pins[3], pins[4], pins[5]],
                };
                Input::Command(LcdCommand::Reinitialize(pins.assignment(line_offset)))
            }
            "read" => Input::Read,
            "state" => Input::State,
            "quit" | "q" => Input::Quit,
            other => return Err(ParseInputError::UnknownCommand(other.to_string())),
        };
        Ok(input)
    }
}

fn expect_args(
    command: &'static str,
    args: &[i32],
    expected: usize,
) -> Result<(), ParseInputError> {
    if args.len() != expected {
        return Err(ParseInputError::ArgumentCount { command, expected });
    }
    Ok(())
}

fn single_arg(command: &'static str, args: &[i32]) -> Result<i32, ParseInputError> {
    expect_args(command, args, 1)?;
    Ok(args[0])
}
