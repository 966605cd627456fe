use super::structs::Telegram;
use super::ElsterParseError;
use crate::can::BusFrame;

/// Shortest payload that still carries the command class and the index.
pub const MIN_TELEGRAM_LEN: usize = 5;

/// Highest valid arbitration id; the Elster bus uses standard 11-bit frames.
const MAX_STANDARD_ID: u32 = 0x7FF;

/// Decodes one CAN frame into an Elster telegram. Pure function of the frame
/// contents.
///
/// Byte layout on the wire: the receiver node id is spread over byte 0 (high
/// nibble, times 8) and byte 1, the command class is the low nibble of
/// byte 0, byte 2 is the index marker, the Elster index sits in bytes 3+4
/// and the raw value, when the telegram carries one, in bytes 5+6 (both
/// big-endian).
pub fn decode_telegram(frame: &BusFrame) -> Result<Telegram, ElsterParseError> {
    if frame.id > MAX_STANDARD_ID {
        return Err(ElsterParseError::IdentifierOutOfRange(frame.id));
    }

    let data = &frame.data;
    if data.len() < MIN_TELEGRAM_LEN {
        return Err(ElsterParseError::TelegramTooShort(data.len()));
    }

    let destination = (data[0] as u16 & 0xF0) * 8 + data[1] as u16;
    let command = data[0] & 0x0F;
    let index = (data[3] as u16) << 8 | data[4] as u16;

    /* Short telegrams (requests) have no value bytes; the raw value is then
     * zero and the caller decides from the role whether it means anything. */
    let raw_value = if data.len() >= 7 {
        (data[5] as u16) << 8 | data[6] as u16
    } else {
        0
    };

    Ok(Telegram {
        source: frame.id as u16,
        destination,
        command,
        index,
        raw_value,
    })
}
