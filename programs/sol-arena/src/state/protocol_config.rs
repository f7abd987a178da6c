use anchor_lang::prelude::*;

/// Global singleton, one per program deployment.
/// Seeds: [b"protocol_config"]
#[account]
pub struct ProtocolConfig {
    pub admin: Pubkey,            // can pause the protocol
    pub is_active: bool,          // kill switch: blocks new tournaments and entries
    pub bump: u8,
}

impl ProtocolConfig {
    pub const SIZE: usize = 8  // discriminator
        + 32  // admin
        + 1   // is_active
        + 1;  // bump
}
