// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::traits::UserId;

/// Check whether an acting principal may edit another user's roles.
///
/// Failing this check is a silent rejection, the caller was never supposed
/// to reach the edit path in the first place.
pub trait EditAuthorizer<U>
where
    U: UserId,
{
    fn can_edit_user(&self, actor: &U, target: &U) -> bool;
}
