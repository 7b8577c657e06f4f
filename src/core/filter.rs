use super::models::ShareRecord;

/// What the drain loop should do with one drained record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not worth reporting: empty path, or a SYSVOL/NETLOGON copy we already
    /// claimed.
    Drop,
    /// Report as discovered but do not scan.
    DiscoverOnly,
    /// Report and scan.
    Scan,
}

/// Run-scoped dedup flags. Domain controllers all replicate the same SYSVOL
/// and NETLOGON content, so one scan each is enough for the whole domain.
/// Owned by the single-threaded drain loop; no locking needed.
#[derive(Debug, Default)]
pub struct DedupState {
    sysvol_claimed: bool,
    netlogon_claimed: bool,
}

pub struct SharePolicy {
    scan_admin_shares: bool,
}

impl SharePolicy {
    pub fn new(scan_admin_shares: bool) -> Self {
        SharePolicy { scan_admin_shares }
    }

    /// Classify one record. Applied exactly once per record, in drain order.
    pub fn admit(&self, record: &ShareRecord, dedup: &mut DedupState) -> Admission {
        if record.path.trim().is_empty() {
            return Admission::Drop;
        }

        let lowered = record.path.to_lowercase();
        if lowered.ends_with("sysvol") {
            if dedup.sysvol_claimed {
                return Admission::Drop;
            }
            dedup.sysvol_claimed = true;
        } else if lowered.ends_with("netlogon") {
            if dedup.netlogon_claimed {
                return Admission::Drop;
            }
            dedup.netlogon_claimed = true;
        }

        // Admin shares are opt-in: high privilege, high noise. The suffix
        // check is deliberately case-sensitive, matching how Windows exposes
        // the share name.
        if record.path.ends_with("C$") && !self.scan_admin_shares {
            return Admission::DiscoverOnly;
        }

        if record.scan_requested {
            Admission::Scan
        } else {
            Admission::DiscoverOnly
        }
    }
}
