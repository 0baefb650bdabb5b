// SPDX-License-Identifier: MIT

//! Static command table for the console interpreter.

/// Command identifiers, one per console command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cmd {
    Help,
    SpiRead,
    SpiWrite,
    ReadBus,
    ReadReg,
    SetVoiceFreq,
    SetOpFreq,
    SetOpAtten,
    SetOpWave,
}

/// One command table entry.
pub struct Entry {
    /// Command name, matched case-sensitively against the first token.
    pub name: &'static str,
    /// Minimum argument count, not counting the command name itself.
    pub min_args: usize,
    pub cmd: Cmd,
}

/// The command table. Order defines dispatch priority: the first matching
/// name wins.
pub static COMMANDS: &[Entry] = &[
    Entry { name: "help", min_args: 0, cmd: Cmd::Help },
    Entry { name: "spi_read", min_args: 1, cmd: Cmd::SpiRead },
    Entry { name: "spi_write", min_args: 2, cmd: Cmd::SpiWrite },
    Entry { name: "readbus", min_args: 0, cmd: Cmd::ReadBus },
    Entry { name: "readreg", min_args: 0, cmd: Cmd::ReadReg },
    Entry { name: "setvfreq", min_args: 2, cmd: Cmd::SetVoiceFreq },
    Entry { name: "setofreq", min_args: 3, cmd: Cmd::SetOpFreq },
    Entry { name: "setoatten", min_args: 3, cmd: Cmd::SetOpAtten },
    Entry { name: "setowave", min_args: 3, cmd: Cmd::SetOpWave },
];

/// Linear scan of the command table, first match wins.
pub fn lookup(name: &str) -> Option<&'static Entry> {
    COMMANDS.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, a) in COMMANDS.iter().enumerate() {
            for b in &COMMANDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("help").is_some());
        assert!(lookup("Help").is_none());
        assert!(lookup("HELP").is_none());
        assert!(lookup("").is_none());
    }
}
