//! Group formation: pick members from the user directory, name the group, persist it.

use shared::domain::{Group, GroupId};
use tracing::{debug, info, warn};

use crate::{
    directory,
    error::AppError,
    events::{ClientEvent, Notice},
    AppContext,
};

/// Emails currently checked, in the order they were checked. No duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    emails: Vec<String>,
}

impl Selection {
    /// Adds the email if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, email: &str) -> bool {
        if let Some(pos) = self.emails.iter().position(|e| e == email) {
            self.emails.remove(pos);
            false
        } else {
            self.emails.push(email.to_string());
            true
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.emails
    }

    pub fn clear(&mut self) {
        self.emails.clear();
    }
}

pub struct GroupFormation {
    ctx: AppContext,
    candidates: Vec<String>,
    selection: Selection,
    selecting: bool,
    naming_open: bool,
    group_name: String,
    /// Minted on the first write attempt and reused until one succeeds, so a retry after a
    /// failed write upserts the same document instead of creating a second group.
    pending_group_id: Option<GroupId>,
}

impl GroupFormation {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            candidates: Vec::new(),
            selection: Selection::default(),
            selecting: false,
            naming_open: false,
            group_name: String::new(),
            pending_group_id: None,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn is_naming_open(&self) -> bool {
        self.naming_open
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn toggle_selection_mode(&mut self) -> bool {
        self.selecting = !self.selecting;
        self.selecting
    }

    /// Fetches every registered user except the signed-in one, in store order.
    pub async fn load_directory(&mut self) -> Result<&[String], AppError> {
        let own_email = self
            .ctx
            .session()
            .current_identity()
            .map(|identity| identity.email);

        let emails = directory::list_user_emails(self.ctx.store().as_ref())
            .await
            .map_err(|error| {
                warn!(error = %format!("{error:#}"), "directory fetch failed");
                self.ctx.report(AppError::store(
                    "Error",
                    format!("Failed to fetch emails: {error}"),
                ))
            })?;

        self.candidates = emails
            .into_iter()
            .filter(|email| Some(email) != own_email.as_ref())
            .collect();
        debug!(candidates = self.candidates.len(), "directory loaded");
        self.ctx.emit(ClientEvent::DirectoryLoaded {
            candidates: self.candidates.len(),
        });
        Ok(&self.candidates)
    }

    pub fn toggle_selection(&mut self, email: &str) -> bool {
        self.selection.toggle(email)
    }

    /// Opens the naming step; refuses with nothing selected and leaves all state as it was.
    pub fn confirm_selection(&mut self) -> Result<(), AppError> {
        if self.selection.is_empty() {
            return Err(self.ctx.report(no_users_selected()));
        }
        self.naming_open = true;
        Ok(())
    }

    pub fn set_group_name(&mut self, name: impl Into<String>) {
        self.group_name = name.into();
    }

    pub fn cancel_naming(&mut self) {
        self.naming_open = false;
    }

    /// Leaving the screen drops the in-progress selection.
    pub fn exit(&mut self) {
        self.reset();
        self.candidates.clear();
    }

    pub async fn create_group(&mut self, name: &str) -> Result<Group, AppError> {
        let group_name = name.trim();
        if group_name.is_empty() {
            return Err(self.ctx.report(AppError::validation(
                "Missing Group Name",
                "Please enter a group name.",
            )));
        }
        if self.selection.is_empty() {
            return Err(self.ctx.report(no_users_selected()));
        }
        let creator = self
            .ctx
            .session()
            .current_identity()
            .ok_or_else(|| self.ctx.report(AppError::NotSignedIn))?;

        let group_id = self
            .pending_group_id
            .get_or_insert_with(GroupId::new_random)
            .clone();

        let mut members = Vec::with_capacity(self.selection.len() + 1);
        members.push(creator.email.clone());
        for email in self.selection.as_slice() {
            if !members.contains(email) {
                members.push(email.clone());
            }
        }

        let group = Group {
            group_id,
            group_name: group_name.to_string(),
            members,
            admin: creator.email,
        };

        if let Err(error) = directory::put_group(self.ctx.store().as_ref(), &group).await {
            warn!(
                group_id = %group.group_id,
                error = %format!("{error:#}"),
                "group write failed"
            );
            return Err(self.ctx.report(AppError::store(
                "Error",
                format!("Failed to create group: {error}"),
            )));
        }

        info!(
            group_id = %group.group_id,
            members = group.members.len(),
            "group created"
        );
        self.ctx.notify(Notice::new(
            "Group Created",
            format!("Group \"{}\" created successfully!", group.group_name),
        ));
        self.ctx.emit(ClientEvent::GroupCreated(group.clone()));
        self.reset();
        Ok(group)
    }

    fn reset(&mut self) {
        self.selection.clear();
        self.group_name.clear();
        self.naming_open = false;
        self.selecting = false;
        self.pending_group_id = None;
    }
}

fn no_users_selected() -> AppError {
    AppError::validation("No Users Selected", "Please select at least one user.")
}

#[cfg(test)]
#[path = "tests/groups_tests.rs"]
mod tests;
