use anchor_lang::prelude::*;
use crate::constants::SEED_PROTOCOL_CONFIG;
use crate::state::ProtocolConfig;

// ===== ACCOUNTS =====

#[derive(Accounts)]
pub struct InitializeProtocolConfig<'info> {
    #[account(
        init,
        payer = admin,
        seeds = [SEED_PROTOCOL_CONFIG],
        space = ProtocolConfig::SIZE,
        bump,
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> InitializeProtocolConfig<'info> {
    pub fn handle(&mut self, bumps: &InitializeProtocolConfigBumps) -> Result<()> {
        let config = &mut self.protocol_config;
        config.admin = self.admin.key();
        config.is_active = true;
        config.bump = bumps.protocol_config;

        msg!("Protocol initialized | admin: {}", config.admin);

        Ok(())
    }
}

// ===== PAUSE SWITCH =====

#[derive(Accounts)]
pub struct SetProtocolActive<'info> {
    #[account(
        mut,
        seeds = [SEED_PROTOCOL_CONFIG],
        bump = protocol_config.bump,
        has_one = admin @ crate::error::ErrorCode::Unauthorized,
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    pub admin: Signer<'info>,
}

impl<'info> SetProtocolActive<'info> {
    pub fn handle(&mut self, active: bool) -> Result<()> {
        self.protocol_config.is_active = active;
        msg!("Protocol active: {}", active);
        Ok(())
    }
}
