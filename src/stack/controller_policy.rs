// Copyright (c) 2025 - Cowboy AI, Inc.
//! Load balancer controller permissions
//!
//! Discovery is read-only and unscoped. Creation is limited to load
//! balancers, target groups, listeners, and rules, and tag changes are limited
//! to load-balancer ARN patterns in the configured region.

use crate::domain::{Condition, PolicyDocument, Statement};

const REQUESTED_REGION: &str = "aws:RequestedRegion";

/// Tag-able load balancer ARN patterns
pub const TAGGABLE_RESOURCES: [&str; 7] = [
    "arn:aws:elasticloadbalancing:*:*:targetgroup/*/*",
    "arn:aws:elasticloadbalancing:*:*:loadbalancer/net/*/*",
    "arn:aws:elasticloadbalancing:*:*:loadbalancer/app/*/*",
    "arn:aws:elasticloadbalancing:*:*:listener/net/*/*",
    "arn:aws:elasticloadbalancing:*:*:listener/app/*/*",
    "arn:aws:elasticloadbalancing:*:*:listener-rule/net/*/*",
    "arn:aws:elasticloadbalancing:*:*:listener-rule/app/*/*",
];

const TARGET_GROUPS: &str = "arn:aws:elasticloadbalancing:*:*:targetgroup/*/*";

/// Permission policy for the in-cluster load balancer controller
pub fn load_balancer_controller_policy(region: &str) -> PolicyDocument {
    let in_region = || Condition::string_equals(REQUESTED_REGION, region);

    PolicyDocument::new(vec![
        Statement::allow("iam:CreateServiceLinkedRole", "*").when(Condition::string_equals(
            "iam:AWSServiceName",
            "elasticloadbalancing.amazonaws.com",
        )),
        Statement::allow(
            vec![
                "ec2:DescribeAccountAttributes",
                "ec2:DescribeAddresses",
                "ec2:DescribeAvailabilityZones",
                "ec2:DescribeInternetGateways",
                "ec2:DescribeVpcs",
                "ec2:DescribeVpcPeeringConnections",
                "ec2:DescribeSubnets",
                "ec2:DescribeSecurityGroups",
                "ec2:DescribeInstances",
                "ec2:DescribeNetworkInterfaces",
                "ec2:DescribeTags",
                "ec2:GetCoipPoolUsage",
                "ec2:GetManagedPrefixListEntries",
                "ec2:DescribeCoipPools",
                "elasticloadbalancing:DescribeLoadBalancers",
                "elasticloadbalancing:DescribeLoadBalancerAttributes",
                "elasticloadbalancing:DescribeListeners",
                "elasticloadbalancing:DescribeListenerAttributes",
                "elasticloadbalancing:DescribeListenerCertificates",
                "elasticloadbalancing:DescribeSSLPolicies",
                "elasticloadbalancing:DescribeRules",
                "elasticloadbalancing:DescribeTargetGroups",
                "elasticloadbalancing:DescribeTargetGroupAttributes",
                "elasticloadbalancing:DescribeTargetHealth",
                "elasticloadbalancing:DescribeTags",
            ],
            "*",
        ),
        Statement::allow(
            vec![
                "cognito-idp:DescribeUserPoolClient",
                "acm:ListCertificates",
                "acm:DescribeCertificate",
                "iam:ListServerCertificates",
                "iam:GetServerCertificate",
                "waf-regional:GetWebACL",
                "waf-regional:GetWebACLForResource",
                "waf-regional:AssociateWebACL",
                "waf-regional:DisassociateWebACL",
                "wafv2:GetWebACL",
                "wafv2:GetWebACLForResource",
                "wafv2:AssociateWebACL",
                "wafv2:DisassociateWebACL",
                "shield:DescribeProtection",
                "shield:GetSubscriptionState",
                "shield:DescribeSubscription",
                "shield:CreateProtection",
                "shield:DeleteProtection",
            ],
            "*",
        ),
        Statement::allow(
            vec![
                "ec2:AuthorizeSecurityGroupIngress",
                "ec2:RevokeSecurityGroupIngress",
                "ec2:CreateSecurityGroup",
                "ec2:CreateTags",
            ],
            "*",
        ),
        Statement::allow(
            vec![
                "elasticloadbalancing:CreateLoadBalancer",
                "elasticloadbalancing:CreateTargetGroup",
            ],
            "*",
        )
        .when(in_region()),
        Statement::allow(
            vec![
                "elasticloadbalancing:CreateListener",
                "elasticloadbalancing:DeleteListener",
                "elasticloadbalancing:CreateRule",
                "elasticloadbalancing:DeleteRule",
            ],
            "*",
        ),
        Statement::allow(
            vec![
                "elasticloadbalancing:AddTags",
                "elasticloadbalancing:RemoveTags",
            ],
            TAGGABLE_RESOURCES.to_vec(),
        )
        .when(in_region()),
        Statement::allow(
            vec![
                "elasticloadbalancing:RegisterTargets",
                "elasticloadbalancing:DeregisterTargets",
            ],
            TARGET_GROUPS,
        ),
        Statement::allow(
            vec![
                "elasticloadbalancing:SetWebAcl",
                "elasticloadbalancing:ModifyListener",
                "elasticloadbalancing:AddListenerCertificates",
                "elasticloadbalancing:RemoveListenerCertificates",
                "elasticloadbalancing:ModifyRule",
            ],
            "*",
        ),
    ])
}
