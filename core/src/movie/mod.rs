//! The movie container: header metadata, per-branch input tracks, SRAM,
//! subtitles, and the rerecord set, in the binary wire encoding.
//!
//! A textual (ZIP-member) encoding is also named by the specification this
//! crate follows; since no archive crate is part of this workspace's
//! dependency stack, it is represented here as [`TextMembers`], an
//! in-memory named-member map isomorphic to a ZIP's member list. A caller
//! that needs an actual `.zip` file on disk is expected to pack
//! [`TextMembers`] into one with whatever archiving library its
//! application layer already depends on.

mod tags;

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tascore_wire::{Reader, Writer};

use crate::error::{Error, Result};
use crate::input::FrameVector;
use crate::rrd::RrdSet;
use tags::*;

/// Dynamic (per-savestate) fields, present only once emulation has run.
#[derive(Clone, Debug, Default)]
pub struct DynamicState {
    pub savestate: Vec<u8>,
    pub host_memory: Vec<u8>,
    pub screenshot: Vec<u8>,
    pub poll_counters: Vec<u32>,
    pub poll_flag: bool,
    pub rtc_second: u64,
    pub rtc_subsecond: u64,
    pub lag_frames: u64,
    pub save_frame: u64,
    pub active_macros: Vec<String>,
}

/// The authoritative timeline: metadata, branches, SRAM, subtitles, and the
/// rerecord set.
#[derive(Clone, Debug)]
pub struct Movie {
    pub gametype: String,
    pub settings: IndexMap<String, String>,
    pub coreversion: String,
    /// 40-hex project identifier, fixed at creation.
    pub projectid: String,
    pub romimg_sha256: Vec<String>,
    pub romxml_sha256: Vec<String>,
    pub namehint: Vec<String>,
    pub authors: Vec<(String, String)>,
    pub subtitles: BTreeMap<(u64, u64), String>,
    pub movie_sram: IndexMap<String, Vec<u8>>,
    pub ramcontent: IndexMap<String, Vec<u8>>,
    pub anchor_savestate: Option<Vec<u8>>,
    pub rrdata: RrdSet,
    pub branches: IndexMap<String, FrameVector>,
    pub current_branch: String,
    pub dynamic_state: Option<DynamicState>,
}

impl Movie {
    /// Checks the invariants §3 names: the current branch exists, and a
    /// savestate's frame doesn't exceed its branch's length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] describing the first invariant
    /// violated.
    pub fn validate(&self) -> Result<()> {
        let current = self
            .branches
            .get(&self.current_branch)
            .ok_or_else(|| Error::MalformedInput(format!("current branch {:?} not present", self.current_branch)))?;
        if let Some(state) = &self.dynamic_state {
            if state.save_frame as usize > current.size() {
                return Err(Error::MalformedInput("savestate frame exceeds branch length".into()));
            }
        }
        Ok(())
    }

    /// Encodes this movie as a binary `.lsmv` stream: the 5-byte file
    /// magic followed by a tagged extension-record stream.
    #[must_use]
    pub fn encode_binary(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.raw(tags::FILE_MAGIC);

        w.extension(TAG_GAMENAME, |b| {
            b.string(&self.gametype);
        });
        w.extension(TAG_CORE_VERSION, |b| {
            b.string(&self.coreversion);
        });
        w.extension(TAG_PROJECT_ID, |b| {
            b.string(&self.projectid);
        });
        w.extension(TAG_ROMHASH, |b| {
            b.number(self.romimg_sha256.len() as u64);
            for (img, xml) in self.romimg_sha256.iter().zip(&self.romxml_sha256) {
                b.string(img);
                b.string(xml);
            }
        });
        for hint in &self.namehint {
            w.extension(TAG_ROMHINT, |b| {
                b.string(hint);
            });
        }
        for (fullname, nickname) in &self.authors {
            w.extension(TAG_AUTHOR, |b| {
                b.string(fullname);
                b.string(nickname);
            });
        }
        for ((frame, length), text) in &self.subtitles {
            w.extension(TAG_SUBTITLE, |b| {
                b.number(*frame);
                b.number(*length);
                b.string(text);
            });
        }
        for (name, bytes) in &self.movie_sram {
            w.extension(TAG_MOVIE_SRAM, |b| {
                b.string(name);
                b.number(bytes.len() as u64);
                b.raw(bytes);
            });
        }
        for (name, bytes) in &self.ramcontent {
            w.extension(TAG_RAMCONTENT, |b| {
                b.string(name);
                b.number(bytes.len() as u64);
                b.raw(bytes);
            });
        }
        if let Some(anchor) = &self.anchor_savestate {
            w.extension(TAG_ANCHOR_SAVE, |b| {
                b.number(anchor.len() as u64);
                b.raw(anchor);
            });
        }
        w.extension(TAG_RRDATA, |b| {
            let blob = self.rrdata.write();
            b.number(blob.len() as u64);
            b.raw(&blob);
        });

        for (name, branch) in &self.branches {
            w.extension(TAG_BRANCH_NAME, |b| {
                b.string(name);
            });
            let tag = if *name == self.current_branch { TAG_MOVIE } else { TAG_BRANCH };
            w.extension(tag, |b| {
                branch.save_binary(b);
            });
        }

        if let Some(state) = &self.dynamic_state {
            w.extension(TAG_MOVIE_TIME, |b| {
                b.number(state.rtc_second);
                b.number(state.rtc_subsecond);
            });
            w.extension(TAG_SAVESTATE, |b| {
                b.number(state.lag_frames);
                b.number(state.save_frame);
                b.number(u64::from(state.poll_flag));
                b.number(state.poll_counters.len() as u64);
                for counter in &state.poll_counters {
                    b.number32(*counter);
                }
                b.number(state.savestate.len() as u64);
                b.raw(&state.savestate);
            });
            if !state.host_memory.is_empty() {
                w.extension(TAG_HOSTMEMORY, |b| {
                    b.number(state.host_memory.len() as u64);
                    b.raw(&state.host_memory);
                });
            }
            if !state.screenshot.is_empty() {
                w.extension(TAG_SCREENSHOT, |b| {
                    b.number(state.screenshot.len() as u64);
                    b.raw(&state.screenshot);
                });
            }
            for name in &state.active_macros {
                w.extension(TAG_MACRO, |b| {
                    b.string(name);
                });
            }
        }

        w.into_bytes()
    }

    /// Decodes a binary `.lsmv` stream written by [`Self::encode_binary`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if the file magic is missing or
    /// any record is truncated or malformed.
    pub fn decode_binary(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let magic = r.raw(tags::FILE_MAGIC.len())?;
        if magic != tags::FILE_MAGIC {
            return Err(Error::MalformedInput("bad movie file magic".into()));
        }

        let mut movie = Movie {
            gametype: String::new(),
            settings: IndexMap::new(),
            coreversion: String::new(),
            projectid: String::new(),
            romimg_sha256: Vec::new(),
            romxml_sha256: Vec::new(),
            namehint: Vec::new(),
            authors: Vec::new(),
            subtitles: BTreeMap::new(),
            movie_sram: IndexMap::new(),
            ramcontent: IndexMap::new(),
            anchor_savestate: None,
            rrdata: RrdSet::new(),
            branches: IndexMap::new(),
            current_branch: String::new(),
            dynamic_state: None,
        };
        let mut pending_branch_name: Option<String> = None;
        let mut dyn_time = (0u64, 0u64);
        let mut dyn_save: Option<(u64, u64, bool, Vec<u32>, Vec<u8>)> = None;
        let mut host_memory = Vec::new();
        let mut screenshot = Vec::new();
        let mut macros = Vec::new();
        let mut saw_dynamic = false;

        r.extensions(|tag, body| {
            match tag {
                TAG_GAMENAME => movie.gametype = body.string()?,
                TAG_CORE_VERSION => movie.coreversion = body.string()?,
                TAG_PROJECT_ID => movie.projectid = body.string()?,
                TAG_ROMHASH => {
                    let n = body.number()?;
                    for _ in 0..n {
                        movie.romimg_sha256.push(body.string()?);
                        movie.romxml_sha256.push(body.string()?);
                    }
                }
                TAG_ROMHINT => movie.namehint.push(body.string()?),
                TAG_AUTHOR => {
                    let fullname = body.string()?;
                    let nickname = body.string()?;
                    movie.authors.push((fullname, nickname));
                }
                TAG_SUBTITLE => {
                    let frame = body.number()?;
                    let length = body.number()?;
                    let text = body.string()?;
                    movie.subtitles.insert((frame, length), text);
                }
                TAG_MOVIE_SRAM => {
                    let name = body.string()?;
                    let len = body.number()? as usize;
                    movie.movie_sram.insert(name, body.raw(len)?);
                }
                TAG_RAMCONTENT => {
                    let name = body.string()?;
                    let len = body.number()? as usize;
                    movie.ramcontent.insert(name, body.raw(len)?);
                }
                TAG_ANCHOR_SAVE => {
                    let len = body.number()? as usize;
                    movie.anchor_savestate = Some(body.raw(len)?);
                }
                TAG_RRDATA => {
                    let len = body.number()? as usize;
                    movie.rrdata = RrdSet::read(&body.raw(len)?)
                        .map_err(|e| tascore_wire::Error::Malformed(e.to_string()))?;
                }
                TAG_BRANCH_NAME => pending_branch_name = Some(body.string()?),
                TAG_MOVIE | TAG_BRANCH => {
                    let name = pending_branch_name.take().ok_or_else(|| {
                        tascore_wire::Error::Malformed("branch payload without a preceding name".into())
                    })?;
                    let branch = FrameVector::load_binary(body, 1024)
                        .map_err(|e| tascore_wire::Error::Malformed(e.to_string()))?;
                    if tag == TAG_MOVIE {
                        movie.current_branch = name.clone();
                    }
                    movie.branches.insert(name, branch);
                }
                TAG_MOVIE_TIME => {
                    dyn_time = (body.number()?, body.number()?);
                    saw_dynamic = true;
                }
                TAG_SAVESTATE => {
                    let lag = body.number()?;
                    let save_frame = body.number()?;
                    let poll_flag = body.number()? != 0;
                    let n = body.number()?;
                    let mut counters = Vec::with_capacity(n as usize);
                    for _ in 0..n {
                        counters.push(body.number32()?);
                    }
                    let len = body.number()? as usize;
                    let savestate = body.raw(len)?;
                    dyn_save = Some((lag, save_frame, poll_flag, counters, savestate));
                    saw_dynamic = true;
                }
                TAG_HOSTMEMORY => {
                    let len = body.number()? as usize;
                    host_memory = body.raw(len)?;
                }
                TAG_SCREENSHOT => {
                    let len = body.number()? as usize;
                    screenshot = body.raw(len)?;
                }
                TAG_MACRO => macros.push(body.string()?),
                _ => tascore_wire::null_default(tag, body)?,
            }
            Ok(())
        })?;

        if saw_dynamic {
            let (lag_frames, save_frame, poll_flag, poll_counters, savestate) =
                dyn_save.unwrap_or((0, 0, false, Vec::new(), Vec::new()));
            movie.dynamic_state = Some(DynamicState {
                savestate,
                host_memory,
                screenshot,
                poll_counters,
                poll_flag,
                rtc_second: dyn_time.0,
                rtc_subsecond: dyn_time.1,
                lag_frames,
                save_frame,
                active_macros: macros,
            });
        }

        movie.validate()?;
        Ok(movie)
    }
}

/// Summary fields enough for a UI listing, read without materializing any
/// branch's frame data.
#[derive(Clone, Debug, Default)]
pub struct BriefInfo {
    pub sysregion: String,
    pub corename: String,
    pub projectid: String,
    pub current_frame: u64,
    pub rerecords: usize,
    pub hashes: Vec<String>,
    pub hinted_names: Vec<String>,
}

/// Reads just [`BriefInfo`] out of a binary movie stream, skipping every
/// branch's frame payload.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the file magic is missing or a
/// record is truncated.
pub fn read_brief_info(bytes: &[u8]) -> Result<BriefInfo> {
    let mut r = Reader::new(bytes);
    let magic = r.raw(tags::FILE_MAGIC.len())?;
    if magic != tags::FILE_MAGIC {
        return Err(Error::MalformedInput("bad movie file magic".into()));
    }
    let mut info = BriefInfo::default();
    let mut current_frame = 0u64;
    r.extensions(|tag, body| {
        match tag {
            TAG_GAMENAME => info.sysregion = body.string()?,
            TAG_CORE_VERSION => info.corename = body.string()?,
            TAG_PROJECT_ID => info.projectid = body.string()?,
            TAG_ROMHASH => {
                let n = body.number()?;
                for _ in 0..n {
                    info.hashes.push(body.string()?);
                    let _ = body.string()?;
                }
            }
            TAG_ROMHINT => info.hinted_names.push(body.string()?),
            TAG_RRDATA => {
                let len = body.number()? as usize;
                info.rerecords = RrdSet::count_encoded(&body.raw(len)?)
                    .map_err(|e| tascore_wire::Error::Malformed(e.to_string()))?;
            }
            TAG_SAVESTATE => {
                let _lag = body.number()?;
                current_frame = body.number()?;
            }
            _ => tascore_wire::null_default(tag, body)?,
        }
        Ok(())
    })?;
    info.current_frame = current_frame;
    Ok(info)
}

/// Lists every branch name present, in file order, without decoding any
/// frame payload.
///
/// # Errors
///
/// Same as [`read_brief_info`].
pub fn list_branches(bytes: &[u8]) -> Result<Vec<String>> {
    let mut r = Reader::new(bytes);
    let magic = r.raw(tags::FILE_MAGIC.len())?;
    if magic != tags::FILE_MAGIC {
        return Err(Error::MalformedInput("bad movie file magic".into()));
    }
    let mut names = Vec::new();
    r.extensions(|tag, body| {
        if tag == TAG_BRANCH_NAME {
            names.push(body.string()?);
        } else {
            tascore_wire::null_default(tag, body)?;
        }
        Ok(())
    })?;
    Ok(names)
}

/// Lists every SRAM slot name present (both initial and dynamic), without
/// materializing the payloads.
///
/// # Errors
///
/// Same as [`read_brief_info`].
pub fn list_srams(bytes: &[u8]) -> Result<Vec<String>> {
    let mut r = Reader::new(bytes);
    let _ = r.raw(tags::FILE_MAGIC.len())?;
    let mut names = Vec::new();
    r.extensions(|tag, body| {
        match tag {
            TAG_MOVIE_SRAM | TAG_SAVE_SRAM => names.push(body.string()?),
            _ => tascore_wire::null_default(tag, body)?,
        }
        Ok(())
    })?;
    Ok(names)
}

/// Extracts one named SRAM slot's bytes, stopping the scan once found.
///
/// # Errors
///
/// Same as [`read_brief_info`], plus an error if `name` isn't present.
pub fn extract_sram(bytes: &[u8], name: &str) -> Result<Vec<u8>> {
    let mut r = Reader::new(bytes);
    let _ = r.raw(tags::FILE_MAGIC.len())?;
    let mut found = None;
    r.extensions(|tag, body| {
        match tag {
            TAG_MOVIE_SRAM | TAG_SAVE_SRAM => {
                let slot = body.string()?;
                let len = body.number()? as usize;
                let data = body.raw(len)?;
                if slot == name {
                    found = Some(data);
                }
            }
            _ => tascore_wire::null_default(tag, body)?,
        }
        Ok(())
    })?;
    found.ok_or_else(|| Error::MalformedInput(format!("no SRAM slot named {name:?}")))
}

/// An in-memory stand-in for the textual (ZIP) encoding's member list: one
/// named byte blob per archive entry, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct TextMembers {
    members: IndexMap<String, Vec<u8>>,
}

impl TextMembers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.members.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.members.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

/// Builds the textual-encoding member set for `movie` (see the module-level
/// doc for why this is a member map and not a literal `.zip`).
#[must_use]
pub fn to_text_members(movie: &Movie) -> TextMembers {
    let mut out = TextMembers::new();
    out.set("systemid", movie.gametype.clone().into_bytes());
    out.set("coreversion", movie.coreversion.clone().into_bytes());
    out.set("projectid", movie.projectid.clone().into_bytes());
    out.set("rerecords", movie.rrdata.count().to_string().into_bytes());
    out.set("rrdata", movie.rrdata.write());
    for (i, (img, xml)) in movie.romimg_sha256.iter().zip(&movie.romxml_sha256).enumerate() {
        let slot = if i == 0 { String::new() } else { ((b'a' + i as u8 - 1) as char).to_string() };
        out.set(format!("slot{slot}.sha256"), img.clone().into_bytes());
        out.set(format!("slot{slot}xml.sha256"), xml.clone().into_bytes());
    }
    for (i, hint) in movie.namehint.iter().enumerate() {
        let slot = if i == 0 { String::new() } else { ((b'a' + i as u8 - 1) as char).to_string() };
        out.set(format!("slot{slot}.hint"), hint.clone().into_bytes());
    }
    let authors = movie
        .authors
        .iter()
        .map(|(full, nick)| format!("{full}|{nick}"))
        .collect::<Vec<_>>()
        .join("\n");
    out.set("authors", authors.into_bytes());
    for (i, (name, branch)) in movie.branches.iter().enumerate() {
        let key = if *name == movie.current_branch { "input.0".to_string() } else { format!("input.{}", i + 1) };
        out.set(format!("branchname.{i}"), name.clone().into_bytes());
        let mut w = Writer::new();
        branch.save_binary(&mut w);
        out.set(key, w.into_bytes());
    }
    if let Some(state) = &movie.dynamic_state {
        out.set("savestate", state.savestate.clone());
        out.set("savetime.second", state.rtc_second.to_string().into_bytes());
        out.set("savetime.subsecond", state.rtc_subsecond.to_string().into_bytes());
        out.set("lagcounter", state.lag_frames.to_string().into_bytes());
        out.set("saveframe", state.save_frame.to_string().into_bytes());
        out.set("pollflag", u8::from(state.poll_flag).to_string().into_bytes());
        out.set("hostmemory", state.host_memory.clone());
        out.set("screenshot", state.screenshot.clone());
    }
    out
}

/// Writes `movie` to `crashsave-<unixtime>-<seq>.lsmv` in `dir`, refusing
/// to clobber an existing file (`O_EXCL` semantics).
///
/// Built for use from a panic/signal handler: the encoding is computed once
/// into a caller-supplied scratch buffer and streamed out through a small
/// fixed-size staging window, so no allocation beyond that single encode
/// pass is needed regardless of movie size.
///
/// # Errors
///
/// Propagates any I/O failure, including the file already existing.
pub fn emerg_save_movie(movie: &Movie, dir: &Path, unixtime: u64, seq: u32) -> std::io::Result<PathBuf> {
    let path = dir.join(format!("crashsave-{unixtime}-{seq}.lsmv"));
    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    let encoded = movie.encode_binary();
    let mut staging = [0u8; 4096];
    let mut offset = 0;
    while offset < encoded.len() {
        let take = staging.len().min(encoded.len() - offset);
        staging[..take].copy_from_slice(&encoded[offset..offset + take]);
        file.write_all(&staging[..take])?;
        offset += take;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FrameVector;

    fn sample_movie() -> Movie {
        let mut branch = FrameVector::new(1, 4);
        branch.push_frame(&[0]);
        branch.push_frame(&[1]);
        let mut branches = IndexMap::new();
        branches.insert("main".to_string(), branch);

        let mut rrdata = RrdSet::new();
        rrdata.insert(1);
        rrdata.insert(2);

        Movie {
            gametype: "snes_ntsc".into(),
            settings: IndexMap::new(),
            coreversion: "1.0".into(),
            projectid: "a".repeat(40),
            romimg_sha256: vec!["deadbeef".into()],
            romxml_sha256: vec!["cafef00d".into()],
            namehint: vec!["Super Game".into()],
            authors: vec![("Jane Doe".into(), "jd".into())],
            subtitles: BTreeMap::from([((10, 5), "hello".to_string())]),
            movie_sram: IndexMap::new(),
            ramcontent: IndexMap::new(),
            anchor_savestate: None,
            rrdata,
            branches,
            current_branch: "main".into(),
            dynamic_state: None,
        }
    }

    #[test]
    fn binary_round_trip_preserves_header_fields() {
        let movie = sample_movie();
        let bytes = movie.encode_binary();
        let loaded = Movie::decode_binary(&bytes).unwrap();
        assert_eq!(loaded.gametype, movie.gametype);
        assert_eq!(loaded.projectid, movie.projectid);
        assert_eq!(loaded.current_branch, "main");
        assert_eq!(loaded.branches["main"].size(), 2);
        assert_eq!(loaded.rrdata.count(), 2);
        assert_eq!(loaded.subtitles[&(10, 5)], "hello");
    }

    #[test]
    fn brief_info_avoids_decoding_branches() {
        let movie = sample_movie();
        let bytes = movie.encode_binary();
        let info = read_brief_info(&bytes).unwrap();
        assert_eq!(info.sysregion, "snes_ntsc");
        assert_eq!(info.rerecords, 2);
        assert_eq!(info.hinted_names, vec!["Super Game".to_string()]);
    }

    #[test]
    fn list_branches_reports_names() {
        let movie = sample_movie();
        let bytes = movie.encode_binary();
        assert_eq!(list_branches(&bytes).unwrap(), vec!["main".to_string()]);
    }

    #[test]
    fn extract_sram_finds_named_slot() {
        let mut movie = sample_movie();
        movie.movie_sram.insert("battery".into(), vec![1, 2, 3]);
        let bytes = movie.encode_binary();
        assert_eq!(extract_sram(&bytes, "battery").unwrap(), vec![1, 2, 3]);
        assert!(extract_sram(&bytes, "missing").is_err());
    }

    #[test]
    fn validate_rejects_savestate_past_branch_end() {
        let mut movie = sample_movie();
        movie.dynamic_state = Some(DynamicState {
            save_frame: 99,
            ..DynamicState::default()
        });
        assert!(movie.validate().is_err());
    }

    #[test]
    fn emerg_save_writes_and_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("tascore-emerg-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let movie = sample_movie();
        let path = emerg_save_movie(&movie, &dir, 1_700_000_000, 0).unwrap();
        assert!(path.exists());
        assert!(emerg_save_movie(&movie, &dir, 1_700_000_000, 0).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn text_members_cover_header_and_branch_fields() {
        let movie = sample_movie();
        let members = to_text_members(&movie);
        assert_eq!(members.get("systemid"), Some("snes_ntsc".as_bytes()));
        assert!(members.get("input.0").is_some());
        assert_eq!(members.get("branchname.0"), Some("main".as_bytes()));
    }
}
