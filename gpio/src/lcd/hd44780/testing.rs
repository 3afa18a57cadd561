use crate::lcd::hd44780::PinAssignment;
use crate::mock::MockGpioDriver;

pub(crate) const PINS: PinAssignment = PinAssignment::new(6, 19, [12, 16, 20, 21]);

/// Decodes the trace into `(rs, nibble)` pairs, as latched by the display on each falling E edge.
pub(crate) fn transfers(gpio: &MockGpioDriver, pins: PinAssignment) -> Vec<(bool, u8)> {
    let lines = [
        pins.register_select,
        pins.data[0],
        pins.data[1],
        pins.data[2],
        pins.data[3],
    ];
    gpio.latched(pins.enable, &lines)
        .into_iter()
        .map(|levels| {
            let nibble = levels[1..]
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i));
            (levels[0], nibble)
        })
        .collect()
}

/// Reassembles decoded nibble pairs into `(rs, byte)` pairs.
pub(crate) fn bytes(transfers: &[(bool, u8)]) -> Vec<(bool, u8)> {
    transfers
        .chunks(2)
        .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
        .collect()
}
