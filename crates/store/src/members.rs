//! Membership store: Member records keyed by id, with an email index
//!
//! Same shape as the catalog: a primary `MemberId → Member` map, a
//! normalized-email uniqueness index, and a maintenance mutex serializing
//! the operations that touch both maps. `adjust_debt` is the only debt
//! mutator and runs under the record guard alone.

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use circ_core::{Error, Member, MemberId, MemberPatch, NewMember, Result};

/// Email comparison key: trimmed, ASCII-lowercased
fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Keyed storage for Member records with email-uniqueness enforcement
#[derive(Debug, Default)]
pub struct MembershipStore {
    members: DashMap<MemberId, Member>,
    by_email: DashMap<String, MemberId>,
    maintenance: Mutex<()>,
}

impl MembershipStore {
    /// Create an empty membership store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot records
    ///
    /// # Errors
    /// Returns `Error::DuplicateEmail` if two records share an email.
    pub fn from_records(records: Vec<Member>) -> Result<Self> {
        let store = Self::new();
        for member in records {
            let key = normalize_email(&member.email);
            if store.by_email.contains_key(&key) {
                return Err(Error::DuplicateEmail(member.email));
            }
            store.by_email.insert(key, member.id);
            store.members.insert(member.id, member);
        }
        Ok(store)
    }

    /// Clone out all records, for snapshots
    pub fn snapshot(&self) -> Vec<Member> {
        self.members.iter().map(|r| r.value().clone()).collect()
    }

    /// Register a new member with zero outstanding debt
    ///
    /// # Errors
    /// - `Error::MissingField` for a blank name or email
    /// - `Error::DuplicateEmail` if the email is already registered
    pub fn create(&self, new: NewMember) -> Result<Member> {
        new.validate()?;
        let _guard = self.maintenance.lock();
        let key = normalize_email(&new.email);
        if self.by_email.contains_key(&key) {
            return Err(Error::DuplicateEmail(new.email));
        }
        let member = Member {
            id: MemberId::new(),
            name: new.name,
            email: new.email,
            outstanding_debt: 0,
        };
        self.members.insert(member.id, member.clone());
        self.by_email.insert(key, member.id);
        debug!(member_id = %member.id, "member created");
        Ok(member)
    }

    /// Fetch a member by id
    pub fn get(&self, id: MemberId) -> Result<Member> {
        self.members
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(Error::MemberNotFound(id))
    }

    /// All members, in no particular order
    pub fn list(&self) -> Vec<Member> {
        self.members.iter().map(|r| r.value().clone()).collect()
    }

    /// Apply a partial update
    pub fn update(&self, id: MemberId, patch: MemberPatch) -> Result<Member> {
        patch.validate()?;
        let _guard = self.maintenance.lock();
        if let Some(new_email) = &patch.email {
            if let Some(existing) = self.by_email.get(&normalize_email(new_email)) {
                if *existing != id {
                    return Err(Error::DuplicateEmail(new_email.clone()));
                }
            }
        }
        let mut entry = self.members.get_mut(&id).ok_or(Error::MemberNotFound(id))?;
        let old_key = normalize_email(&entry.email);
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(email) = patch.email {
            entry.email = email;
        }
        let new_key = normalize_email(&entry.email);
        if new_key != old_key {
            self.by_email.remove(&old_key);
            self.by_email.insert(new_key, id);
        }
        Ok(entry.clone())
    }

    /// Remove a member record
    pub fn remove(&self, id: MemberId) -> Result<Member> {
        self.remove_if(id, |_| Ok(()))
    }

    /// Remove a member record if `predicate` allows it
    ///
    /// The predicate runs under the record's exclusive guard; a concurrent
    /// issue or return holding the member pinned finishes first, and the
    /// predicate then sees its loan or fee.
    pub fn remove_if(
        &self,
        id: MemberId,
        predicate: impl FnOnce(&Member) -> Result<()>,
    ) -> Result<Member> {
        let _guard = self.maintenance.lock();
        let mut refusal = None;
        let removed = self.members.remove_if(&id, |_, member| match predicate(member) {
            Ok(()) => true,
            Err(e) => {
                refusal = Some(e);
                false
            }
        });
        if let Some(e) = refusal {
            return Err(e);
        }
        let (_, member) = removed.ok_or(Error::MemberNotFound(id))?;
        self.by_email.remove(&normalize_email(&member.email));
        debug!(member_id = %member.id, "member removed");
        Ok(member)
    }

    /// Run a read-only closure while holding the member's record guard
    ///
    /// While the guard is held, the member cannot be removed; the engine
    /// uses this to keep eligibility checks and the loan they authorize in
    /// one atomic unit.
    pub fn with_member<T>(
        &self,
        id: MemberId,
        f: impl FnOnce(&Member) -> Result<T>,
    ) -> Result<T> {
        let entry = self.members.get(&id).ok_or(Error::MemberNotFound(id))?;
        f(&entry)
    }

    /// Adjust the debt balance by a signed delta, atomically
    ///
    /// Positive deltas accrue fees; negative deltas settle debt.
    ///
    /// # Errors
    /// - `Error::MemberNotFound` for an unknown id
    /// - `Error::DebtWouldGoNegative` if settlement exceeds the balance;
    ///   nothing is applied in that case
    pub fn adjust_debt(&self, id: MemberId, delta: i64) -> Result<Member> {
        self.adjust_debt_and(id, delta, |_| Ok(()))
            .map(|(member, ())| member)
    }

    /// Adjust debt and run `f` under the same record guard
    ///
    /// The closure sees the record as it was before the adjustment; the
    /// delta is applied only after `f` returns Ok.
    pub fn adjust_debt_and<T>(
        &self,
        id: MemberId,
        delta: i64,
        f: impl FnOnce(&Member) -> Result<T>,
    ) -> Result<(Member, T)> {
        let mut entry = self.members.get_mut(&id).ok_or(Error::MemberNotFound(id))?;
        debug_assert!(i64::try_from(entry.outstanding_debt).is_ok());
        let next = entry.outstanding_debt as i64 + delta;
        if next < 0 {
            return Err(Error::DebtWouldGoNegative {
                member_id: id,
                debt: entry.outstanding_debt,
            });
        }
        let out = f(&entry)?;
        entry.outstanding_debt = next as u64;
        debug!(member_id = %id, delta, debt = entry.outstanding_debt, "debt adjusted");
        Ok((entry.clone(), out))
    }

    /// Number of registered members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
