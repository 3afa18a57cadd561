use lcd1602_gpio::lcd::hd44780::{
    CursorAddress, DisplayState, LcdCommand, LcdConfig, LcdDevice, LcdError, PinAssignment,
    MAX_TEXT_LEN,
};
use lcd1602_gpio::mock::{MockDelay, MockGpioDriver};

const PINS: PinAssignment = PinAssignment::new(6, 19, [12, 16, 20, 21]);

type Device<'a> = LcdDevice<'a, MockGpioDriver, MockDelay>;

fn open(gpio: &MockGpioDriver) -> Device<'_> {
    LcdDevice::open(gpio, gpio.delay(), LcdConfig::default(), PINS).unwrap()
}

/// Bytes latched by the display, as `(rs, byte)`.
fn latched_bytes(gpio: &MockGpioDriver) -> Vec<(bool, u8)> {
    let lines = [
        PINS.register_select,
        PINS.data[0],
        PINS.data[1],
        PINS.data[2],
        PINS.data[3],
    ];
    let nibbles: Vec<(bool, u8)> = gpio
        .latched(PINS.enable, &lines)
        .into_iter()
        .map(|l| {
            let value = (0..4).fold(0u8, |acc, i| acc | (u8::from(l[i + 1]) << i));
            (l[0], value)
        })
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
        .collect()
}

fn read_to_end(device: &mut Device<'_>) -> Vec<u8> {
    let mut text = Vec::new();
    let mut offset = 0;
    let mut buf = [0u8; 5];
    loop {
        let n = device.read(&mut buf, &mut offset);
        if n == 0 {
            break;
        }
        text.extend_from_slice(&buf[..n]);
    }
    text
}

#[test]
fn test_hello_world_round_trip() {
    let gpio = MockGpioDriver::new(32);
    let mut device = open(&gpio);
    assert_eq!(device.state(), DisplayState::Ready);

    let written = device.write(b"Hello World!!!").unwrap();
    assert_eq!(written.accepted, 14);
    assert!(!written.truncated());

    let mut buf = [0u8; 32];
    let mut offset = 0;
    assert_eq!(device.read(&mut buf, &mut offset), 14);
    assert_eq!(&buf[..14], b"Hello World!!!");
}

#[test]
fn test_write_read_is_truncated_prefix() {
    let inputs: [&[u8]; 5] = [
        b"",
        b"x",
        b"Line 1 testing\n",
        b"exactly thirty-two bytes long!!!",
        b"this one is definitely longer than the panel\n",
    ];

    for input in inputs {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(input).unwrap();

        let mut expected = input[..input.len().min(MAX_TEXT_LEN)].to_vec();
        if expected.last() == Some(&b'\n') {
            *expected.last_mut().unwrap() = b' ';
        }
        assert_eq!(read_to_end(&mut device), expected);
    }
}

#[test]
fn test_forty_byte_write() {
    let gpio = MockGpioDriver::new(32);
    let mut device = open(&gpio);
    let input: Vec<u8> = (b'A'..).take(40).collect();
    gpio.clear_trace();

    let written = device.write(&input).unwrap();
    assert_eq!(written.requested, 40);
    assert_eq!(written.accepted, MAX_TEXT_LEN);
    assert_eq!(device.text(), &input[..MAX_TEXT_LEN]);

    let mut expected = vec![(false, 0x01)];
    expected.extend(input[..16].iter().map(|&b| (true, b)));
    expected.push((false, 0xC0));
    expected.extend(input[16..32].iter().map(|&b| (true, b)));
    assert_eq!(latched_bytes(&gpio), expected);
}

#[test]
fn test_set_line_out_of_bounds_leaves_display_alone() {
    let gpio = MockGpioDriver::new(32);
    let mut device = open(&gpio);
    device.write(b"abc").unwrap();
    let cursor = device.display().cursor();
    gpio.clear_trace();

    assert!(matches!(
        device.control(LcdCommand::SetLine1(20)),
        Err(LcdError::OutOfBounds { .. })
    ));
    assert!(gpio.trace().is_empty());
    assert_eq!(device.display().cursor(), cursor);
    assert_eq!(device.state(), DisplayState::Ready);
}

#[test]
fn test_line_tests_like_the_host_harness() {
    let gpio = MockGpioDriver::new(32);
    let mut device = open(&gpio);

    device.control(LcdCommand::Clear).unwrap();
    device.control(LcdCommand::SetLine1(0)).unwrap();
    device.write(b"Line 1 testing").unwrap();
    device.control(LcdCommand::SetLine2(0)).unwrap();
    assert_eq!(
        device.display().cursor(),
        CursorAddress { line: 1, column: 0 }
    );
    device.control(LcdCommand::ScrollLeft(5)).unwrap();
    device.control(LcdCommand::ScrollRight(8)).unwrap();

    let scrolls = latched_bytes(&gpio)
        .into_iter()
        .filter(|&(rs, b)| !rs && (b == 0x18 || b == 0x1C))
        .count();
    assert_eq!(scrolls, 13);

    device.close();
    assert!(gpio.levels().iter().all(|&level| !level));
}

#[test]
fn test_uninitialized_device_rejects_everything_but_init() {
    let gpio = MockGpioDriver::new(32);
    let mut device: Device<'_> = LcdDevice::new(&gpio, gpio.delay(), LcdConfig::default());

    assert_eq!(
        device.control(LcdCommand::Clear),
        Err(LcdError::NotReady(DisplayState::Uninitialized))
    );
    assert!(device.write(b"x").is_err());
    assert!(gpio.trace().is_empty());

    device.control(LcdCommand::Reinitialize(PINS)).unwrap();
    assert_eq!(device.state(), DisplayState::Ready);
}
