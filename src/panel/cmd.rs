/// Power IC bus addressing.
pub struct Cmd;
impl Cmd {
    /// 7-bit I2C address of the panel power IC
    pub const I2C_ADDRESS: u8 = 0x68;

    /// Rail enable register, every sequencing step writes here
    pub const POWER_CONTROL: u8 = 0x01;
}

/*
Rail bring-up observed on the board:
0x01 <- 0x20 - VDD
0x01 <- 0xA0 - VDD + VPOS/VNEG/VGH/VGL
0x01 <- 0x3F - all rails + VCOM
*/
