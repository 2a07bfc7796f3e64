//! User group membership lookup.
//!
//! # Responsibilities
//! - Resolve the OS groups a user belongs to (primary and supplementary)
//! - Report users unknown to the host system as an error
//!
//! # Design Decisions
//! - Returns a `BTreeSet` so callers iterate groups in a stable order
//! - System lookups go through the C library, so NSS sources (LDAP, sssd) work
//! - NSS may block on the network; on a multi-thread runtime the lookup runs
//!   under `block_in_place` so the worker thread is handed off first

use std::collections::{BTreeSet, HashMap};

/// Error type for group lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("group lookup failed for '{user}': {reason}")]
    Lookup { user: String, reason: String },
}

/// Source of group memberships.
pub trait GroupSource: Send + Sync {
    fn groups_of(&self, user: &str) -> Result<BTreeSet<String>, GroupError>;
}

/// Fixed membership table.
#[derive(Debug, Clone, Default)]
pub struct StaticGroups {
    members: HashMap<String, BTreeSet<String>>,
}

impl StaticGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user` with the given groups. A user with no groups is still known.
    pub fn with_user<I, S>(mut self, user: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members
            .entry(user.to_string())
            .or_default()
            .extend(groups.into_iter().map(Into::into));
        self
    }
}

impl GroupSource for StaticGroups {
    fn groups_of(&self, user: &str) -> Result<BTreeSet<String>, GroupError> {
        self.members
            .get(user)
            .cloned()
            .ok_or_else(|| GroupError::UnknownUser(user.to_string()))
    }
}

/// Group lookup through the system user database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGroups;

#[cfg(target_os = "linux")]
impl GroupSource for SystemGroups {
    fn groups_of(&self, user: &str) -> Result<BTreeSet<String>, GroupError> {
        use tokio::runtime::{Handle, RuntimeFlavor};

        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => {
                tokio::task::block_in_place(|| sys::groups_of(user))
            }
            // block_in_place panics on a current-thread runtime.
            _ => sys::groups_of(user),
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl GroupSource for SystemGroups {
    fn groups_of(&self, user: &str) -> Result<BTreeSet<String>, GroupError> {
        Err(GroupError::Lookup {
            user: user.to_string(),
            reason: "system group lookup is only supported on Linux".to_string(),
        })
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::collections::BTreeSet;
    use std::ffi::{CStr, CString};
    use std::ptr;

    use super::GroupError;

    const INITIAL_BUFFER: usize = 1024;
    const MAX_BUFFER: usize = 1 << 20;

    pub(super) fn groups_of(user: &str) -> Result<BTreeSet<String>, GroupError> {
        let c_user = CString::new(user).map_err(|_| GroupError::UnknownUser(user.to_string()))?;
        let primary = primary_gid(user, &c_user)?;

        let mut ngroups: libc::c_int = 32;
        let gids = loop {
            let mut gids: Vec<libc::gid_t> = vec![0; ngroups as usize];
            let capacity = ngroups;
            // SAFETY: `gids` has room for `ngroups` entries; getgrouplist
            // writes at most that many and updates `ngroups`.
            let rc = unsafe {
                libc::getgrouplist(c_user.as_ptr(), primary, gids.as_mut_ptr(), &mut ngroups)
            };
            if rc >= 0 {
                gids.truncate(ngroups.max(0) as usize);
                break gids;
            }
            ngroups = if ngroups > capacity { ngroups } else { capacity * 2 };
            if ngroups as usize > MAX_BUFFER {
                return Err(lookup_error(user, "too many groups"));
            }
        };

        Ok(gids.into_iter().filter_map(group_name).collect())
    }

    fn primary_gid(user: &str, c_user: &CStr) -> Result<libc::gid_t, GroupError> {
        let mut buf_len = INITIAL_BUFFER;
        loop {
            let mut buf: Vec<libc::c_char> = vec![0; buf_len];
            // SAFETY: zeroed passwd is a valid out-parameter; all pointers
            // written into it point into `buf`, which outlives their use.
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = ptr::null_mut();
            let rc = unsafe {
                libc::getpwnam_r(c_user.as_ptr(), &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc == libc::ERANGE && buf_len < MAX_BUFFER {
                buf_len *= 2;
                continue;
            }
            if rc != 0 {
                return Err(lookup_error(user, &std::io::Error::from_raw_os_error(rc).to_string()));
            }
            if result.is_null() {
                return Err(GroupError::UnknownUser(user.to_string()));
            }
            return Ok(pwd.pw_gid);
        }
    }

    fn group_name(gid: libc::gid_t) -> Option<String> {
        let mut buf_len = INITIAL_BUFFER;
        loop {
            let mut buf: Vec<libc::c_char> = vec![0; buf_len];
            // SAFETY: as in `primary_gid`.
            let mut grp: libc::group = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::group = ptr::null_mut();
            let rc = unsafe { libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
            if rc == libc::ERANGE && buf_len < MAX_BUFFER {
                buf_len *= 2;
                continue;
            }
            if rc != 0 || result.is_null() || grp.gr_name.is_null() {
                tracing::debug!(gid, "No group entry for gid");
                return None;
            }
            // SAFETY: gr_name is a NUL-terminated string inside `buf`.
            let name = unsafe { CStr::from_ptr(grp.gr_name) };
            return Some(name.to_string_lossy().into_owned());
        }
    }

    fn lookup_error(user: &str, reason: &str) -> GroupError {
        GroupError::Lookup {
            user: user.to_string(),
            reason: reason.to_string(),
        }
    }
}
