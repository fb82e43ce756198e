// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network topology
//!
//! One VPC with an internet gateway and a shared public route table, plus one
//! public/private subnet pair per availability zone. Every zone gets its own
//! Elastic IP, NAT gateway, and private route table, so zone `i` maps to
//! exactly one of each.

use crate::config::StackConfig;
use crate::deferred::{combine, Deferred};
use crate::domain::invariants::{validate_subnet_layout, validate_zone_coverage};
use crate::domain::{ResourceKind, DEFAULT_ROUTE};
use crate::errors::ProvisioningResult;
use crate::graph::{Inputs, Resource, ResourceGraph};

/// Tag marking subnets for internet-facing load balancers
pub const PUBLIC_LB_ROLE_TAG: &str = "kubernetes.io/role/elb";
/// Tag marking subnets for internal load balancers
pub const INTERNAL_LB_ROLE_TAG: &str = "kubernetes.io/role/internal-elb";

/// Resources owned by one availability zone
#[derive(Debug, Clone)]
pub struct ZoneNetwork {
    pub zone: String,
    pub public_subnet: Resource,
    pub private_subnet: Resource,
    pub elastic_ip: Resource,
    pub nat_gateway: Resource,
    pub private_route_table: Resource,
}

/// Declared network topology
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    vpc: Resource,
    internet_gateway: Resource,
    public_route_table: Resource,
    zones: Vec<ZoneNetwork>,
}

impl NetworkTopology {
    /// Declare the topology into `graph`
    ///
    /// Zones are taken in order, one per subnet pair.
    ///
    /// # Errors
    ///
    /// Returns a validation error, with nothing declared, when the public
    /// and private CIDR lists differ in length, when a block is malformed or
    /// outside the VPC, or when there are fewer zones than pairs.
    pub fn declare(
        graph: &ResourceGraph,
        config: &StackConfig,
        zones: &[String],
    ) -> ProvisioningResult<Self> {
        let layout = config.subnet_layout()?;
        let all_subnets: Vec<_> = layout.public.iter().chain(&layout.private).copied().collect();
        validate_subnet_layout(&layout.vpc, &all_subnets)?;
        validate_zone_coverage(layout.pairs(), zones.len())?;

        let base = config.base_tags();
        let name = |suffix: &str| config.resource_name(suffix);

        let vpc = graph.declare(
            ResourceKind::Vpc,
            name("vpc"),
            Inputs::new()
                .set("cidr_block", layout.vpc.as_cidr())
                .set("enable_dns_hostnames", true)
                .set("enable_dns_support", true)
                .tags(&base.named(name("vpc"))),
        )?;

        let internet_gateway = graph.declare(
            ResourceKind::InternetGateway,
            name("igw"),
            Inputs::new()
                .set("vpc_id", vpc.id())
                .tags(&base.named(name("igw"))),
        )?;

        let public_route_table = graph.declare(
            ResourceKind::RouteTable,
            name("public-rt"),
            Inputs::new()
                .set("vpc_id", vpc.id())
                .set("destination_cidr_block", DEFAULT_ROUTE)
                .set("gateway_id", internet_gateway.id())
                .tags(&base.named(name("public-rt"))),
        )?;

        let mut zone_networks = Vec::with_capacity(layout.pairs());
        for (i, (zone, (public_cidr, private_cidr))) in zones
            .iter()
            .zip(layout.public.iter().zip(&layout.private))
            .enumerate()
        {
            let index = i + 1;

            let public_subnet = graph.declare(
                ResourceKind::Subnet,
                name(&format!("public-{index}")),
                Inputs::new()
                    .set("vpc_id", vpc.id())
                    .set("cidr_block", public_cidr.as_cidr())
                    .set("availability_zone", zone.as_str())
                    .set("map_public_ip_on_launch", true)
                    .tags(
                        &base
                            .clone()
                            .with(PUBLIC_LB_ROLE_TAG, "1")
                            .named(name(&format!("public-{zone}"))),
                    ),
            )?;

            graph.declare(
                ResourceKind::RouteTableAssociation,
                name(&format!("public-rt-assoc-{index}")),
                Inputs::new()
                    .set("subnet_id", public_subnet.id())
                    .set("route_table_id", public_route_table.id()),
            )?;

            let elastic_ip = graph.declare(
                ResourceKind::ElasticIp,
                name(&format!("nat-eip-{index}")),
                Inputs::new()
                    .set("domain", "vpc")
                    .tags(&base.named(name(&format!("nat-eip-{zone}")))),
            )?;

            let nat_gateway = graph.declare(
                ResourceKind::NatGateway,
                name(&format!("natgw-{index}")),
                Inputs::new()
                    .set("subnet_id", public_subnet.id())
                    .set("allocation_id", elastic_ip.id())
                    .tags(&base.named(name(&format!("natgw-{zone}")))),
            )?;

            let private_subnet = graph.declare(
                ResourceKind::Subnet,
                name(&format!("private-{index}")),
                Inputs::new()
                    .set("vpc_id", vpc.id())
                    .set("cidr_block", private_cidr.as_cidr())
                    .set("availability_zone", zone.as_str())
                    .set("map_public_ip_on_launch", false)
                    .tags(
                        &base
                            .clone()
                            .with(INTERNAL_LB_ROLE_TAG, "1")
                            .named(name(&format!("private-{zone}"))),
                    ),
            )?;

            let private_route_table = graph.declare(
                ResourceKind::RouteTable,
                name(&format!("private-rt-{index}")),
                Inputs::new()
                    .set("vpc_id", vpc.id())
                    .set("destination_cidr_block", DEFAULT_ROUTE)
                    .set("nat_gateway_id", nat_gateway.id())
                    .tags(&base.named(name(&format!("private-rt-{zone}")))),
            )?;

            graph.declare(
                ResourceKind::RouteTableAssociation,
                name(&format!("private-rt-assoc-{index}")),
                Inputs::new()
                    .set("subnet_id", private_subnet.id())
                    .set("route_table_id", private_route_table.id()),
            )?;

            zone_networks.push(ZoneNetwork {
                zone: zone.clone(),
                public_subnet,
                private_subnet,
                elastic_ip,
                nat_gateway,
                private_route_table,
            });
        }

        Ok(Self {
            vpc,
            internet_gateway,
            public_route_table,
            zones: zone_networks,
        })
    }

    pub fn vpc(&self) -> &Resource {
        &self.vpc
    }

    pub fn vpc_id(&self) -> Deferred<String> {
        self.vpc.id()
    }

    pub fn internet_gateway_id(&self) -> Deferred<String> {
        self.internet_gateway.id()
    }

    pub fn public_route_table(&self) -> &Resource {
        &self.public_route_table
    }

    /// Per-zone resources, in zone order
    pub fn zones(&self) -> &[ZoneNetwork] {
        &self.zones
    }

    pub fn public_subnets(&self) -> impl Iterator<Item = &Resource> {
        self.zones.iter().map(|z| &z.public_subnet)
    }

    pub fn private_subnets(&self) -> impl Iterator<Item = &Resource> {
        self.zones.iter().map(|z| &z.private_subnet)
    }

    /// Public subnet ids, in zone order
    pub fn public_subnet_ids(&self) -> Deferred<Vec<String>> {
        combine(self.public_subnets().map(Resource::id).collect())
    }

    /// Private subnet ids, in zone order
    pub fn private_subnet_ids(&self) -> Deferred<Vec<String>> {
        combine(self.private_subnets().map(Resource::id).collect())
    }

    /// Public then private subnet ids
    pub fn all_subnet_ids(&self) -> Deferred<Vec<String>> {
        combine(
            self.public_subnets()
                .chain(self.private_subnets())
                .map(Resource::id)
                .collect(),
        )
    }
}
