//! 访问控制规则
//!
//! 纯逻辑：根据路由规则、会话与订阅状态得出访问结论，不依赖 DOM。

use crate::{Role, SessionUser, SubscriptionStatus};

/// 路由的访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    pub requires_auth: bool,
    /// 为空表示任意角色
    pub roles: &'static [Role],
    pub requires_subscription: bool,
}

impl AccessRule {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        roles: &[],
        requires_subscription: false,
    };

    pub const MEMBER: Self = Self {
        requires_auth: true,
        roles: &[],
        requires_subscription: true,
    };
}

/// 会话加载状态
#[derive(Debug, Clone, Copy)]
pub enum UserState<'a> {
    Loading,
    Anonymous,
    SignedIn(&'a SessionUser),
}

/// 订阅查询状态
#[derive(Debug, Clone, Copy)]
pub enum BillingState<'a> {
    Loading,
    /// 从支付页返回后正在确认付款
    Verifying,
    /// 查询失败
    Failed,
    Loaded(Option<&'a SubscriptionStatus>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Loading,
    RedirectToLogin,
    Forbidden,
    SubscriptionRequired,
    Suspended,
    Granted,
}

/// 计算访问结论
///
/// 演示账号跳过订阅检查；订阅查询失败或没有数据时放行。
pub fn evaluate(rule: AccessRule, user: UserState<'_>, billing: BillingState<'_>) -> AccessDecision {
    if !rule.requires_auth {
        return AccessDecision::Granted;
    }

    let user = match user {
        UserState::Loading => return AccessDecision::Loading,
        UserState::Anonymous => return AccessDecision::RedirectToLogin,
        UserState::SignedIn(user) => user,
    };

    if !rule.roles.is_empty() && !rule.roles.contains(&user.role) {
        return AccessDecision::Forbidden;
    }

    if !rule.requires_subscription || user.is_demo {
        return AccessDecision::Granted;
    }

    match billing {
        BillingState::Loading | BillingState::Verifying => AccessDecision::Loading,
        BillingState::Failed | BillingState::Loaded(None) => AccessDecision::Granted,
        BillingState::Loaded(Some(status)) if status.is_premium => AccessDecision::Granted,
        BillingState::Loaded(Some(status)) if status.is_suspended() => AccessDecision::Suspended,
        BillingState::Loaded(Some(_)) => AccessDecision::SubscriptionRequired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, is_demo: bool) -> SessionUser {
        SessionUser {
            id: "u1".into(),
            prenom: "Léa".into(),
            nom: "Martin".into(),
            email: "lea@agence.fr".into(),
            role,
            agence_id: "ag1".into(),
            is_demo,
        }
    }

    fn status(plan: &str, status: &str, is_premium: bool) -> SubscriptionStatus {
        SubscriptionStatus {
            plan: plan.into(),
            status: status.into(),
            is_premium,
        }
    }

    #[test]
    fn test_public_route_always_granted() {
        let decision = evaluate(AccessRule::PUBLIC, UserState::Anonymous, BillingState::Failed);
        assert_eq!(decision, AccessDecision::Granted);
    }

    #[test]
    fn test_waits_for_session() {
        let decision = evaluate(AccessRule::MEMBER, UserState::Loading, BillingState::Loading);
        assert_eq!(decision, AccessDecision::Loading);
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        let decision = evaluate(AccessRule::MEMBER, UserState::Anonymous, BillingState::Loading);
        assert_eq!(decision, AccessDecision::RedirectToLogin);
    }

    #[test]
    fn test_role_mismatch_is_forbidden() {
        let member = user(Role::Member, false);
        let premium = status("premium", "actif", true);
        let owner_only = AccessRule {
            roles: &[Role::Owner],
            ..AccessRule::MEMBER
        };
        let decision = evaluate(
            owner_only,
            UserState::SignedIn(&member),
            BillingState::Loaded(Some(&premium)),
        );
        assert_eq!(decision, AccessDecision::Forbidden);
    }

    #[test]
    fn test_demo_user_skips_subscription() {
        let demo = user(Role::Owner, true);
        let decision = evaluate(AccessRule::MEMBER, UserState::SignedIn(&demo), BillingState::Loading);
        assert_eq!(decision, AccessDecision::Granted);
    }

    #[test]
    fn test_billing_failure_lets_user_through() {
        let owner = user(Role::Owner, false);
        let decision = evaluate(AccessRule::MEMBER, UserState::SignedIn(&owner), BillingState::Failed);
        assert_eq!(decision, AccessDecision::Granted);
    }

    #[test]
    fn test_payment_verification_keeps_loading() {
        let owner = user(Role::Owner, false);
        let decision = evaluate(AccessRule::MEMBER, UserState::SignedIn(&owner), BillingState::Verifying);
        assert_eq!(decision, AccessDecision::Loading);
    }

    #[test]
    fn test_suspended_and_free_plans() {
        let owner = user(Role::Owner, false);
        let suspended = status("premium", "suspendu", false);
        let free = status("free", "actif", false);

        assert_eq!(
            evaluate(AccessRule::MEMBER, UserState::SignedIn(&owner), BillingState::Loaded(Some(&suspended))),
            AccessDecision::Suspended
        );
        assert_eq!(
            evaluate(AccessRule::MEMBER, UserState::SignedIn(&owner), BillingState::Loaded(Some(&free))),
            AccessDecision::SubscriptionRequired
        );
        assert_eq!(
            evaluate(AccessRule::MEMBER, UserState::SignedIn(&owner), BillingState::Loaded(None)),
            AccessDecision::Granted
        );
    }
}
