//! End-to-end checks over a small universe of units: matching, fragments,
//! patches, touchpoint merging and updates working together.

use std::sync::{Arc, Once};

use tracing_subscriber::EnvFilter;
use unitkit_core::{
    Environment, FactoryConfig, InstallableView, NAMESPACE_UNIT_FRAGMENT, NAMESPACE_UNIT_ID,
    Patch, ProvidedCapability, Requirement, RequirementChange, ResolvedUnit, Satisfaction,
    Severity, TouchpointData, TouchpointInstruction, Unit, UnitFactory, UpdateDescriptor, Version,
    VersionRange, attach_fragments, candidates, evaluate, is_match, is_satisfied_by,
    singleton_conflict,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn v(s: &str) -> Version {
    Version::parse(s).expect("valid version")
}

fn range(s: &str) -> VersionRange {
    VersionRange::parse(s).expect("valid range")
}

fn package(name: &str, version: &str) -> ProvidedCapability {
    ProvidedCapability::new("java.package", name, v(version)).expect("valid capability")
}

fn needs(name: &str, r: &str) -> Requirement {
    Requirement::range("java.package", name, range(r)).expect("valid requirement")
}

/// A factory plus the units built from it.
struct Universe {
    factory: UnitFactory,
    units: Vec<Arc<Unit>>,
}

impl Universe {
    fn new() -> Self {
        init_tracing();
        Self {
            factory: UnitFactory::with_config(&FactoryConfig::default()),
            units: Vec::new(),
        }
    }

    fn add(&mut self, unit: Unit) -> Arc<Unit> {
        let unit = Arc::new(unit);
        self.units.push(Arc::clone(&unit));
        unit
    }

    fn plain(
        &mut self,
        id: &str,
        version: &str,
        provides: &[(&str, &str)],
        requires: &[Requirement],
    ) -> Arc<Unit> {
        let unit = self
            .factory
            .description(id, v(version))
            .add_provided_capabilities(provides.iter().map(|(n, pv)| package(n, pv)))
            .add_requirements(requires.iter().cloned())
            .finish()
            .expect("valid unit");
        self.add(unit)
    }

    fn fragment(
        &mut self,
        id: &str,
        host: &str,
        host_range: &str,
        requires: &[Requirement],
    ) -> Arc<Unit> {
        let host = UnitFactory::host_requirement(host, range(host_range)).expect("valid host");
        let unit = self
            .factory
            .description(id, v("1.0.0"))
            .fragment(host)
            .add_requirements(requires.iter().cloned())
            .finish()
            .expect("valid fragment");
        self.add(unit)
    }
}

#[test]
fn test_empty_range_includes_everything() {
    for version in ["", "0.0.1", "1.2.3", "2.0.0-rc.1", "weird-build", "MAX"] {
        assert!(VersionRange::EMPTY.includes(&v(version)), "{version}");
    }
    assert!(VersionRange::EMPTY.is_empty_range());
    assert!(!range("[MIN,MAX]").is_empty_range());
}

#[test]
fn test_range_boundaries() {
    let r = range("[1.0.0,2.0.0)");
    assert!(r.includes(&v("1.0.0")));
    assert!(!r.includes(&v("2.0.0")));
    assert!(r.includes(&v("1.9.9")));

    let open = range("(1.0.0,2.0.0]");
    assert!(!open.includes(&v("1.0.0")));
    assert!(open.includes(&v("2.0.0")));
}

#[test]
fn test_unspecified_version_sorts_lowest() {
    assert!(Version::EMPTY < v("0.0.0"));
    assert!(Version::EMPTY < v("anything"));
    assert_eq!(Version::EMPTY, Version::MIN);
}

#[test]
fn test_namespace_mismatch_never_satisfies() {
    let cap = package("org.example", "1.0.0");
    let same_name_other_ns =
        Requirement::range("osgi.bundle", "org.example", VersionRange::EMPTY).expect("valid");
    assert!(!is_satisfied_by(&cap, &same_name_other_ns));
    assert!(is_satisfied_by(&cap, &needs("org.example", "*")));
}

#[test]
fn test_triplet_round_trip() {
    let req = needs("org.example", "[1.0.0,2.0.0)");
    let (ns, name, r) = req.as_triplet().expect("built from a triplet");
    let rebuilt = Requirement::range(ns, name, r.clone()).expect("valid");
    assert_eq!(rebuilt, req);
}

#[test]
fn test_requirements_resolve_against_universe() {
    let mut universe = Universe::new();
    universe.plain("lib", "1.5.0", &[("org.lib", "1.5.0")], &[]);
    universe.plain("lib", "2.1.0", &[("org.lib", "2.1.0")], &[]);
    let app = universe.plain(
        "app",
        "1.0.0",
        &[],
        &[
            needs("org.lib", "[1.0.0,2.0.0)"),
            needs("org.absent", "*").optional(),
            needs("org.banned", "*").excluded(),
        ],
    );

    let lib_req = needs("org.lib", "[1.0.0,2.0.0)");
    let matching: Vec<_> = candidates(universe.units.iter().map(Arc::as_ref), &lib_req)
        .map(|u| u.version().to_string())
        .collect();
    assert_eq!(matching, vec!["1.5.0"]);

    let flat: Vec<Unit> = universe.units.iter().map(|u| (**u).clone()).collect();
    let outcomes: Vec<_> = evaluate(app.as_ref(), &Environment::new(), &flat)
        .into_iter()
        .map(|(_, s)| s)
        .collect();
    assert_eq!(
        outcomes,
        vec![
            Satisfaction::Satisfied,
            Satisfaction::Satisfied,
            Satisfaction::Satisfied
        ]
    );
}

#[test]
fn test_fragment_resolution() {
    let mut universe = Universe::new();
    let host = universe.plain("host", "2.0.0", &[("org.host", "2.0.0")], &[needs("h.dep", "*")]);
    let f1 = universe.fragment("f1", "host", "[1.0.0,3.0.0)", &[needs("f1.dep", "*")]);
    let f2 = universe.fragment("f2", "host", "2.0.0", &[needs("f2.dep", "*")]);
    let stray = universe.fragment("f3", "host", "[3.0.0,4.0.0)", &[needs("f3.dep", "*")]);

    for fragment in [&f1, &f2, &stray] {
        assert!(
            fragment
                .provided_capabilities()
                .iter()
                .any(|c| c.namespace() == NAMESPACE_UNIT_FRAGMENT)
        );
        assert!(
            fragment
                .provided_capabilities()
                .iter()
                .all(|c| c.namespace() != NAMESPACE_UNIT_ID)
        );
    }

    let resolved = attach_fragments(Arc::clone(&host), universe.units.iter().cloned());
    let expected: Vec<Requirement> = host
        .requirements()
        .iter()
        .chain(f1.requirements())
        .chain(f2.requirements())
        .cloned()
        .collect();
    let actual: Vec<Requirement> = resolved.requirements().cloned().collect();
    assert_eq!(actual, expected);

    // Still the host for identity purposes.
    assert_eq!(InstallableView::id(&resolved), "host");
    assert!(is_match(
        &resolved,
        &UnitFactory::unit_requirement("host", VersionRange::EMPTY).expect("valid")
    ));
    assert!(!is_match(
        &resolved,
        &Requirement::range(NAMESPACE_UNIT_FRAGMENT, "f1", VersionRange::EMPTY).expect("valid")
    ));
}

#[test]
fn test_patch_rewrites_matching_targets() {
    let mut universe = Universe::new();
    let target = universe.plain(
        "target",
        "1.0.0",
        &[("r1", "1.0.0"), ("r2", "1.0.0")],
        &[needs("old.dep", "[1.0.0,2.0.0)"), needs("kept.dep", "*")],
    );
    let other = universe.plain("other", "1.0.0", &[("r1", "1.0.0")], &[needs("old.dep", "*")]);

    let patch = Patch::new(
        vec![
            vec![needs("r1", "*"), needs("r2", "*")],
            vec![needs("r3", "*")],
        ],
        vec![
            RequirementChange::new(
                Some(needs("old.dep", "[1.0.0,2.0.0)")),
                Some(needs("old.dep", "[1.2.0,2.0.0)")),
            )
            .expect("compatible"),
            RequirementChange::new(None, Some(needs("extra.dep", "*"))).expect("addition"),
        ],
        Some(UnitFactory::unit_requirement("target", VersionRange::EMPTY).expect("valid")),
    );
    let patch_unit = universe
        .factory
        .description("target.patch", v("1.0.0"))
        .patch(patch)
        .finish()
        .expect("valid patch");
    let patch = patch_unit.patch().expect("is a patch");

    assert!(patch.applies_to(target.as_ref()));
    assert!(!patch.applies_to(other.as_ref()));
    assert!(patch.apply(other.as_ref()).is_none());

    let rewritten = patch.apply(target.as_ref()).expect("applies");
    assert_eq!(
        rewritten,
        vec![
            needs("old.dep", "[1.2.0,2.0.0)"),
            needs("kept.dep", "*"),
            needs("extra.dep", "*"),
        ]
    );

    assert!(patch.lifecycle_satisfied(universe.units.iter().map(Arc::as_ref)));
    assert!(!patch.lifecycle_satisfied([other.as_ref()]));
}

#[test]
fn test_touchpoint_merge() {
    let configure = |body: &str| {
        TouchpointData::new().with_instruction("configure", TouchpointInstruction::new(body))
    };
    let merged = configure("a").merge(&configure("b"));
    assert_eq!(
        merged.instruction("configure").and_then(TouchpointInstruction::body),
        Some("a;b")
    );

    let factory = UnitFactory::new();
    let native = factory
        .touchpoint_type("native", &v("1.0.0"))
        .expect("valid touchpoint type");
    let unit = factory
        .description("tp", v("1.0.0"))
        .touchpoint_type(Arc::clone(&native))
        .add_touchpoint_data(configure("a;"))
        .add_touchpoint_data(configure("b"))
        .finish()
        .expect("valid unit");
    assert_eq!(unit.touchpoint_data()[0], merged);
    assert!(Arc::ptr_eq(
        &native,
        &factory.touchpoint_type("native", &v("1.0.0")).expect("cached")
    ));
}

#[test]
fn test_update_descriptor_cases() {
    let descriptor =
        UpdateDescriptor::for_range("x", range("[0.0.0,5.0.0)"), Severity::Normal).expect("valid");
    let mut universe = Universe::new();
    let x3 = universe.plain("x", "3.0.0", &[], &[]);
    let y3 = universe.plain("y", "3.0.0", &[], &[]);
    let x5 = universe.plain("x", "5.0.0", &[], &[]);

    assert!(descriptor.is_update_of(&x3));
    assert!(!descriptor.is_update_of(&y3));
    assert!(!descriptor.is_update_of(&x5));

    let newer = universe
        .factory
        .description("x", v("6.0.0"))
        .update_descriptor(descriptor.with_description("replaces 0.x to 4.x"))
        .finish()
        .expect("valid unit");
    assert_eq!(
        newer.update_descriptor().and_then(UpdateDescriptor::description),
        Some("replaces 0.x to 4.x")
    );
}

#[test]
fn test_singletons_and_environment_filters() {
    let mut universe = Universe::new();
    let linux_only = universe
        .factory
        .description("native.linux", v("1.0.0"))
        .singleton(true)
        .filter("(os=linux)".parse().expect("valid filter"))
        .finish()
        .expect("valid unit");
    let linux_only = universe.add(linux_only);
    let other = universe
        .factory
        .description("native.linux", v("2.0.0"))
        .singleton(true)
        .finish()
        .expect("valid unit");

    assert!(singleton_conflict(linux_only.as_ref(), &other));
    assert!(linux_only.is_applicable(&Environment::new().with("os", "linux")));
    assert!(!linux_only.is_applicable(&Environment::new().with("os", "win32")));

    let resolved = ResolvedUnit::from(Arc::clone(&linux_only));
    assert!(singleton_conflict(&resolved, &other));
}
