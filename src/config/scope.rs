//! The layered configuration tree: server scope, anonymous blocks, and the
//! directive occurrences that matter to the core (`UserAlias`,
//! `AnonymousGroup`, `UserPassword`, `GroupPassword`).

use camino::Utf8PathBuf;

use super::directives::DirectiveTable;

/// A `UserAlias <from> <to>` occurrence, tagged with the anonymous block it
/// was declared inside, if any. The reference walks the whole configuration
/// tree (including nested anonymous blocks) when searching for aliases, so
/// this table flattens that walk into declaration order up front.
#[derive(Debug, Clone)]
pub struct AliasDirective {
    /// The name the client supplies (`*` matches any name).
    pub from: String,
    /// The name the alias rewrites to.
    pub to: String,
    /// Index into [`ServerScope::anonymous_blocks`] if this alias was
    /// declared inside an anonymous block; `None` for server-scope aliases.
    pub owner_anon_index: Option<usize>,
}

/// A `UserPassword <user> <hash>` or `GroupPassword <group> <hash>` occurrence.
#[derive(Debug, Clone)]
pub struct PasswordDirective {
    /// The user or group name the directive applies to.
    pub subject: String,
    /// The stored secret form (e.g. a salted SHA-256 hex digest).
    pub stored_hash: String,
    /// Index into [`ServerScope::anonymous_blocks`] if declared inside an
    /// anonymous block; `None` for server-scope directives.
    pub owner_anon_index: Option<usize>,
}

/// An `AnonymousGroup <group-expr>` occurrence. The "group expression" is
/// modeled as a plain group name; the reference supports richer boolean
/// expressions, which is orthogonal to the core's privilege-transition logic.
#[derive(Debug, Clone)]
pub struct AnonymousGroupRule {
    /// The group name that, if present in the login's group memberships,
    /// forces a synthesized anonymous binding.
    pub group: String,
}

/// A configured `<Anonymous ~owner>` block.
#[derive(Debug, Clone, Default)]
pub struct AnonymousScope {
    /// The canonical name of the block's owner account (e.g. `ftp`).
    pub owner: String,
    /// The declared (pre-canonicalization) chroot root for this block.
    pub root: Utf8PathBuf,
    /// Directives local to this block; unresolved lookups fall back to the
    /// server scope.
    pub directives: DirectiveTable,
}

impl AnonymousScope {
    /// Returns whether `UserDirRoot` is set for this block.
    #[must_use]
    pub fn userdir_root(&self) -> bool {
        self.directives.first_bool("UserDirRoot").unwrap_or(false)
    }
}

/// The root of the layered configuration: server-scope directives plus the
/// anonymous blocks and cross-cutting directive occurrences declared
/// anywhere in the tree.
#[derive(Debug, Clone, Default)]
pub struct ServerScope {
    /// Directives declared directly at server scope.
    pub directives: DirectiveTable,
    /// Anonymous blocks declared anywhere in the configuration, in
    /// declaration order.
    pub anonymous_blocks: Vec<AnonymousScope>,
    /// Every `UserAlias` occurrence in the tree, in declaration order.
    pub aliases: Vec<AliasDirective>,
    /// Every `UserPassword` occurrence in the tree, in declaration order.
    pub user_passwords: Vec<PasswordDirective>,
    /// Every `GroupPassword` occurrence in the tree, in declaration order.
    pub group_passwords: Vec<PasswordDirective>,
    /// Every `AnonymousGroup` occurrence, in declaration order.
    pub anonymous_group_rules: Vec<AnonymousGroupRule>,
}

impl ServerScope {
    /// Creates an empty server scope with no anonymous blocks or directives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an anonymous block, returning its index for use by
    /// [`ServerScope::add_alias`] and friends.
    pub fn add_anonymous_block(&mut self, block: AnonymousScope) -> usize {
        self.anonymous_blocks.push(block);
        self.anonymous_blocks.len() - 1
    }

    /// Registers a `UserAlias` occurrence.
    pub fn add_alias(&mut self, from: &str, to: &str, owner_anon_index: Option<usize>) {
        self.aliases.push(AliasDirective {
            from: from.to_owned(),
            to: to.to_owned(),
            owner_anon_index,
        });
    }

    /// Registers a `UserPassword` occurrence.
    pub fn add_user_password(&mut self, user: &str, stored_hash: &str, owner_anon_index: Option<usize>) {
        self.user_passwords.push(PasswordDirective {
            subject: user.to_owned(),
            stored_hash: stored_hash.to_owned(),
            owner_anon_index,
        });
    }

    /// Registers a `GroupPassword` occurrence.
    pub fn add_group_password(&mut self, group: &str, stored_hash: &str, owner_anon_index: Option<usize>) {
        self.group_passwords.push(PasswordDirective {
            subject: group.to_owned(),
            stored_hash: stored_hash.to_owned(),
            owner_anon_index,
        });
    }

    /// Registers an `AnonymousGroup` occurrence.
    pub fn add_anonymous_group_rule(&mut self, group: &str) {
        self.anonymous_group_rules.push(AnonymousGroupRule {
            group: group.to_owned(),
        });
    }

    /// Finds the anonymous block whose declared owner equals `name`.
    #[must_use]
    pub fn anonymous_block_for_owner(&self, name: &str) -> Option<usize> {
        self.anonymous_blocks
            .iter()
            .position(|block| block.owner == name)
    }

    /// Looks up a boolean directive at the given scope, recursing into the
    /// server scope if not found locally.
    #[must_use]
    pub fn lookup_bool(&self, anon_index: Option<usize>, name: &str) -> Option<bool> {
        if let Some(idx) = anon_index {
            if let Some(block) = self.anonymous_blocks.get(idx) {
                if let Some(value) = block.directives.first_bool(name) {
                    return Some(value);
                }
            }
        }
        self.directives.first_bool(name)
    }

    /// Looks up a string directive at the given scope, recursing into the
    /// server scope if not found locally.
    #[must_use]
    pub fn lookup_str(&self, anon_index: Option<usize>, name: &str) -> Option<&str> {
        if let Some(idx) = anon_index {
            if let Some(block) = self.anonymous_blocks.get(idx) {
                if let Some(value) = block.directives.first_arg(name) {
                    return Some(value);
                }
            }
        }
        self.directives.first_arg(name)
    }

    /// Looks up an integer directive at the given scope, recursing into the
    /// server scope if not found locally.
    #[must_use]
    pub fn lookup_int(&self, anon_index: Option<usize>, name: &str) -> Option<i64> {
        if let Some(idx) = anon_index {
            if let Some(block) = self.anonymous_blocks.get(idx) {
                if let Some(value) = block.directives.first_int(name) {
                    return Some(value);
                }
            }
        }
        self.directives.first_int(name)
    }
}
