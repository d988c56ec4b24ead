//! Resolves a login name against the layered configuration tree.
//!
//! Implements the four-step precedence algorithm: alias search (discarding
//! aliases declared inside an `AuthAliasOnly` anonymous block that the
//! searched name did not enter through), anonymous-block association,
//! `AnonymousGroup` fallback, and `AuthAliasOnly` enforcement.

use camino::Utf8PathBuf;

use super::scope::ServerScope;

/// The anonymous-block scope a resolved login is associated with, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveScope {
    /// The login resolved to server scope; no anonymous block applies.
    Server,
    /// The login resolved into the anonymous block at this index.
    Anonymous(usize),
}

impl EffectiveScope {
    /// Returns the anonymous-block index, if this scope is anonymous.
    #[must_use]
    pub const fn anon_index(self) -> Option<usize> {
        match self {
            Self::Server => None,
            Self::Anonymous(idx) => Some(idx),
        }
    }
}

/// The outcome of resolving a login name against the configuration tree.
#[derive(Debug, Clone)]
pub struct ResolvedLogin {
    /// The name as supplied by the client on `USER`.
    pub original_user: String,
    /// The name after alias rewriting, or `original_user` unchanged if no
    /// alias applied.
    pub effective_user: Option<String>,
    /// The scope the login is associated with.
    pub scope: EffectiveScope,
    /// Whether the association was forced by `AnonymousGroup` membership
    /// rather than an explicit alias or `~owner` match (a "synthetic"
    /// anonymous binding).
    pub synthetic_anonymous: bool,
}

/// Callback used to test whether a resolved principal belongs to a given
/// named group, used for `AnonymousGroup` fallback. Kept generic over the
/// Identity Provider Facade so the resolver has no dependency on it.
pub trait GroupMembership {
    /// Returns whether `user` is a member of `group`.
    fn is_member(&self, user: &str, group: &str) -> bool;
}

impl ServerScope {
    /// Resolves `original_user` against this configuration tree.
    ///
    /// `membership` is consulted only when no alias or `~owner` match is
    /// found, to evaluate `AnonymousGroup` rules.
    #[must_use]
    pub fn resolve(&self, original_user: &str, membership: &dyn GroupMembership) -> ResolvedLogin {
        if let Some(resolved) = self.resolve_via_alias(original_user) {
            return resolved;
        }

        if let Some(idx) = self.anonymous_block_for_owner(original_user) {
            return ResolvedLogin {
                original_user: original_user.to_owned(),
                effective_user: None,
                scope: EffectiveScope::Anonymous(idx),
                synthetic_anonymous: false,
            };
        }

        if self.resolve_via_anonymous_group(original_user, membership) {
            return ResolvedLogin {
                original_user: original_user.to_owned(),
                effective_user: Some(original_user.to_owned()),
                scope: EffectiveScope::Server,
                synthetic_anonymous: true,
            };
        }

        ResolvedLogin {
            original_user: original_user.to_owned(),
            effective_user: Some(original_user.to_owned()),
            scope: EffectiveScope::Server,
            synthetic_anonymous: false,
        }
    }

    /// Step 1: searches every `UserAlias` for a match on `original_user`. A
    /// candidate declared inside an anonymous block that sets
    /// `AuthAliasOnly on` is discarded and the scan continues from the next
    /// candidate, rather than returning immediately; `AuthAliasOnly`
    /// constrains which *names* may enter that block, it does not mark the
    /// alias itself as an accepted entry point.
    fn resolve_via_alias(&self, original_user: &str) -> Option<ResolvedLogin> {
        for alias in &self.aliases {
            let matches = alias.from == "*" || alias.from == original_user;
            if !matches {
                continue;
            }

            if let Some(idx) = alias.owner_anon_index {
                let block_requires_alias_only =
                    self.anonymous_blocks.get(idx).is_some_and(|block| block.directives.first_bool("AuthAliasOnly").unwrap_or(false));
                if block_requires_alias_only {
                    continue;
                }
            }

            let scope = alias.owner_anon_index.map_or(EffectiveScope::Server, EffectiveScope::Anonymous);

            return Some(ResolvedLogin {
                original_user: original_user.to_owned(),
                effective_user: Some(alias.to.clone()),
                scope,
                synthetic_anonymous: false,
            });
        }
        None
    }

    /// Step 3: evaluates each `AnonymousGroup` rule against `original_user`'s
    /// group memberships; the first match forces the *forced-anon* path,
    /// with the synthetic binding's root computed later from the user's
    /// home directory (the resolver has no identity-provider dependency
    /// beyond group membership, so it signals the match and leaves root
    /// computation to the caller).
    fn resolve_via_anonymous_group(&self, original_user: &str, membership: &dyn GroupMembership) -> bool {
        self.anonymous_group_rules
            .iter()
            .any(|rule| membership.is_member(original_user, &rule.group))
    }

    /// Step 4: enforces `AuthAliasOnly` on a server-scope (non-anonymous)
    /// resolution. Returns `true` if the resolution must be rejected because
    /// the name equals an anonymous block's declared owner but the block
    /// requires entry via alias only and no alias matched.
    #[must_use]
    pub fn violates_auth_alias_only(&self, resolved: &ResolvedLogin) -> bool {
        if resolved.scope != EffectiveScope::Server {
            return false;
        }
        self.anonymous_blocks
            .iter()
            .any(|block| block.owner == resolved.original_user)
            && self.lookup_bool(None, "AuthAliasOnly").unwrap_or(false)
    }

    /// Returns the effective chroot root for a resolved anonymous login, if
    /// the resolution is anonymous.
    #[must_use]
    pub fn anonymous_root(&self, resolved: &ResolvedLogin) -> Option<&Utf8PathBuf> {
        resolved
            .scope
            .anon_index()
            .and_then(|idx| self.anonymous_blocks.get(idx))
            .map(|block| &block.root)
    }
}
