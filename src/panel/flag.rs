/// Values written to [`Cmd::POWER_CONTROL`](super::cmd::Cmd::POWER_CONTROL).
///
/// The power-up values and the power-down values are not bitwise complements of
/// each other; the power IC expects exactly these bytes in this order.
pub struct Flag;
#[allow(missing_docs)]
impl Flag {
    // Power-up, in order
    pub const ENABLE_VDD: u8 = 0x20;
    pub const ENABLE_AUX_RAILS: u8 = 0xA0;
    pub const ENABLE_VCOM: u8 = 0x3F;

    // Power-down, in order
    pub const DISABLE_VCOM: u8 = 0x2F;
    pub const DISABLE_AUX_RAILS: u8 = 0x60;
    pub const DISABLE_ALL: u8 = 0x00;

    // Data bus masks applied to the waveform table
    pub const WAVEFORM_MASK_DRAW: u8 = 0b0101_0101;
    pub const WAVEFORM_ERASE: u8 = 0b1111_1111;
}
