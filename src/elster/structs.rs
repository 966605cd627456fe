use std::fmt;

/// One decoded Elster telegram.
///
/// The index only means something together with the command class: the same
/// index travels without a value in a request and with one in the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    /// Node that sent the frame (the CAN arbitration id).
    pub source: u16,
    /// Node the telegram is addressed to, spread over payload bytes 0 and 1.
    pub destination: u16,
    /// Raw command class, the low nibble of payload byte 0.
    pub command: u8,
    /// Elster index from payload bytes 3+4, big-endian.
    pub index: u16,
    /// Raw value from payload bytes 5+6, zero when the frame carries none.
    pub raw_value: u16,
}

impl Telegram {
    pub fn role(&self) -> TelegramRole {
        TelegramRole::from_command(self.command)
    }
}

/// What a telegram does on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramRole {
    /// Asks another node for the value of an index.
    Request,
    /// Carries the confirmed value of an index. The only role that is
    /// published.
    Answer,
    /// Writes a new value to an index.
    Change,
    /// Anything else seen on the bus.
    Unknown,
}

impl TelegramRole {
    /// Total mapping from the wire command class. Codes outside the known
    /// set classify as Unknown so foreign traffic never stops the loop.
    pub fn from_command(command: u8) -> TelegramRole {
        match command & 0x0F {
            1 => TelegramRole::Request,
            2 => TelegramRole::Answer,
            9 => TelegramRole::Change,
            _ => TelegramRole::Unknown,
        }
    }
}

impl fmt::Display for TelegramRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TelegramRole::Request => "Request",
            TelegramRole::Answer => "Answer",
            TelegramRole::Change => "Change",
            TelegramRole::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// How the raw 16-bit value of an index is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElsterType {
    /// Unsigned value, passed through unchanged.
    Integer,
    /// Two's complement value divided by the scale. The scale must be a
    /// power of ten (the shipped table uses 10, 100 and 1000); other scales
    /// misplace the decimal point.
    Decimal(u32),
    /// Zero is off, everything else is on.
    Bool,
    /// Finite set of named states.
    Enum(&'static [(u16, &'static str)]),
}

impl fmt::Display for ElsterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElsterType::Integer => write!(f, "Integer"),
            ElsterType::Decimal(scale) => write!(f, "Decimal({})", scale),
            ElsterType::Bool => write!(f, "Bool"),
            ElsterType::Enum(_) => write!(f, "Enum"),
        }
    }
}

/// An interpreted value. The variant follows the [ElsterType] of the index
/// the value was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElsterValue {
    Integer(u16),
    Decimal { raw: i16, scale: u32 },
    Bool(bool),
    State(&'static str),
}

impl ElsterValue {
    /// Numeric view for consumers that want the scaled number instead of
    /// the payload string. States and switches have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ElsterValue::Integer(value) => Some(*value as f64),
            ElsterValue::Decimal { raw, scale } => Some(*raw as f64 / *scale as f64),
            ElsterValue::Bool(_) => None,
            ElsterValue::State(_) => None,
        }
    }
}

impl fmt::Display for ElsterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElsterValue::Integer(value) => write!(f, "{}", value),
            /* Integer math, exact digits for any scale. */
            ElsterValue::Decimal { raw, scale } => {
                /* Scales below 10 break the power-of-ten contract and
                 * degenerate to the plain integer. */
                if *scale < 10 {
                    return write!(f, "{}", raw);
                }
                let sign = if *raw < 0 { "-" } else { "" };
                let magnitude = (*raw as i32).unsigned_abs();
                let digits = scale.ilog10() as usize;
                write!(
                    f,
                    "{}{}.{:0width$}",
                    sign,
                    magnitude / scale,
                    magnitude % scale,
                    width = digits
                )
            }
            ElsterValue::Bool(value) => write!(f, "{}", value),
            ElsterValue::State(name) => write!(f, "{}", name),
        }
    }
}

/// Final result for one telegram, handed to the console diagnostics and the
/// publish decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub index: u16,
    /// Name the bus documentation uses (German).
    pub name: &'static str,
    /// Name used on the MQTT topic, the english form when the table has one.
    pub topic_name: &'static str,
    pub role: TelegramRole,
    /// Interpreted value; requests carry none.
    pub value: Option<ElsterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping_is_total_and_stable() {
        for command in 0u8..=255 {
            let role = TelegramRole::from_command(command);
            assert_eq!(role, TelegramRole::from_command(command));
            match command & 0x0F {
                1 => assert_eq!(role, TelegramRole::Request),
                2 => assert_eq!(role, TelegramRole::Answer),
                9 => assert_eq!(role, TelegramRole::Change),
                _ => assert_eq!(role, TelegramRole::Unknown),
            }
        }
    }

    #[test]
    fn decimal_display_uses_exact_tenths() {
        let value = ElsterValue::Decimal { raw: 215, scale: 10 };
        assert_eq!(value.to_string(), "21.5");
    }

    #[test]
    fn decimal_display_handles_negative_values() {
        /* 0xFF38 on the wire is -20.0 degrees */
        let value = ElsterValue::Decimal { raw: -200, scale: 10 };
        assert_eq!(value.to_string(), "-20.0");
    }

    #[test]
    fn decimal_display_pads_the_fraction() {
        let value = ElsterValue::Decimal { raw: 3, scale: 100 };
        assert_eq!(value.to_string(), "0.03");

        let value = ElsterValue::Decimal { raw: 1234, scale: 1000 };
        assert_eq!(value.to_string(), "1.234");
    }

    #[test]
    fn decimal_display_tolerates_a_degenerate_scale() {
        let value = ElsterValue::Decimal { raw: 215, scale: 0 };
        assert_eq!(value.to_string(), "215");

        let value = ElsterValue::Decimal { raw: -200, scale: 1 };
        assert_eq!(value.to_string(), "-200");
    }

    #[test]
    fn decimal_display_survives_the_extreme_raw_value() {
        let value = ElsterValue::Decimal {
            raw: i16::MIN,
            scale: 10,
        };
        assert_eq!(value.to_string(), "-3276.8");
    }

    #[test]
    fn scalar_displays_match_the_payload_format() {
        assert_eq!(ElsterValue::Integer(8009).to_string(), "8009");
        assert_eq!(ElsterValue::Bool(true).to_string(), "true");
        assert_eq!(ElsterValue::Bool(false).to_string(), "false");
        assert_eq!(ElsterValue::State("Automatik").to_string(), "Automatik");
    }

    #[test]
    fn numeric_view_scales_like_the_display() {
        let value = ElsterValue::Decimal { raw: -200, scale: 10 };
        assert_eq!(value.as_f64(), Some(-20.0));
        assert_eq!(ElsterValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(ElsterValue::Bool(true).as_f64(), None);
        assert_eq!(ElsterValue::State("Automatik").as_f64(), None);
    }
}
