//! Binary movie extension-record tags (§6: big-endian `u32` on the wire).

pub const TAG_ANCHOR_SAVE: u32 = 0xF5E0_FAD7;
pub const TAG_AUTHOR: u32 = 0xAFFF_97B4;
pub const TAG_CORE_VERSION: u32 = 0xE434_4C7E;
pub const TAG_GAMENAME: u32 = 0xE80D_6970;
pub const TAG_HOSTMEMORY: u32 = 0x3BF9_D187;
pub const TAG_MACRO: u32 = 0xD261_338F;
pub const TAG_MOVIE: u32 = 0xF3DC_A44B;
pub const TAG_MOVIE_SRAM: u32 = 0xBBC8_24B7;
pub const TAG_MOVIE_TIME: u32 = 0x18C3_A975;
pub const TAG_PROJECT_ID: u32 = 0x359B_FBAB;
pub const TAG_ROMHASH: u32 = 0x0428_ACFC;
pub const TAG_RRDATA: u32 = 0xA3A0_7F71;
pub const TAG_SAVE_SRAM: u32 = 0xAE9B_FB2F;
pub const TAG_SAVESTATE: u32 = 0x2E5B_C2AC;
pub const TAG_SCREENSHOT: u32 = 0xC676_0D0E;
pub const TAG_SUBTITLE: u32 = 0x6A70_54D3;
pub const TAG_RAMCONTENT: u32 = 0xD3EC_3770;
pub const TAG_ROMHINT: u32 = 0x6F71_5830;
pub const TAG_BRANCH: u32 = 0xF2E6_0707;
pub const TAG_BRANCH_NAME: u32 = 0x6DCB_2155;

/// The 5-byte file magic prefixing every binary movie: `"lsmv\x1A"`.
pub const FILE_MAGIC: &[u8; 5] = b"lsmv\x1a";
