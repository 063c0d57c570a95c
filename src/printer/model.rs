use std::fmt::Display;

/// Models that identify themselves in byte 4 of the status packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Model {
    BrotherQL800,
    BrotherQL810W,
    BrotherQL820NWB,
    BrotherQL1100,
    BrotherQL1110NWB,
    BrotherQL1115NWB,
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Model::*;

        let model_nr = match self {
            BrotherQL800 => "800",
            BrotherQL810W => "810W",
            BrotherQL820NWB => "820NWB",
            BrotherQL1100 => "1100",
            BrotherQL1110NWB => "1110NWB",
            BrotherQL1115NWB => "1115NWB",
        };

        write!(f, "QL-{}", model_nr)
    }
}

impl TryFrom<u8> for Model {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Model::*;

        Ok(match value {
            0x38 => BrotherQL800,
            0x39 => BrotherQL810W,
            0x41 => BrotherQL820NWB,
            0x43 => BrotherQL1100,
            0x44 => BrotherQL1110NWB,
            0x45 => BrotherQL1115NWB,

            other => return Err(other),
        })
    }
}

impl Model {
    /// The status model code.
    pub fn code(&self) -> u8 {
        use Model::*;

        match self {
            BrotherQL800 => 0x38,
            BrotherQL810W => 0x39,
            BrotherQL820NWB => 0x41,
            BrotherQL1100 => 0x43,
            BrotherQL1110NWB => 0x44,
            BrotherQL1115NWB => 0x45,
        }
    }
}
