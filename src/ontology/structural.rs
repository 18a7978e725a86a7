use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use super::{
    entities::LoadedOntology,
    reasoner::{Reasoner, ReasonerError},
    value_objects::{ClassExpression, Iri, LiteralValue},
    vocab,
};

/// Reasoner answering queries from told axioms only.
///
/// Subsumption follows `rdfs:subClassOf` and `owl:equivalentClass` chains,
/// property values follow `rdfs:subPropertyOf`, `owl:inverseOf`, symmetric and
/// transitive characteristics. Anonymous superclass expressions are not
/// classified. The equivalence partition and the upward closure of every
/// class are precomputed on construction.
#[derive(Clone, Debug)]
pub struct StructuralReasoner {
    classes: BTreeSet<Iri>,
    components: Vec<BTreeSet<ClassExpression>>,
    component_of: BTreeMap<ClassExpression, usize>,
    told_supers: BTreeMap<Iri, BTreeSet<Iri>>,
    closures: BTreeMap<Iri, BTreeSet<Iri>>,
    types: BTreeMap<Iri, BTreeSet<Iri>>,
    object_values: BTreeMap<Iri, BTreeMap<Iri, BTreeSet<Iri>>>,
    data_values: BTreeMap<Iri, BTreeMap<Iri, BTreeSet<LiteralValue>>>,
    sub_properties: BTreeMap<Iri, BTreeSet<Iri>>,
    inverses: BTreeMap<Iri, BTreeSet<Iri>>,
    symmetric: BTreeSet<Iri>,
    transitive: BTreeSet<Iri>,
    disjoint: BTreeSet<(Iri, Iri)>,
}

impl StructuralReasoner {
    /// Merges the axioms of the whole import closure and precomputes the
    /// equivalence partition.
    #[must_use]
    pub fn new(loaded: &LoadedOntology) -> Self {
        let mut reasoner = Self {
            classes: BTreeSet::new(),
            components: Vec::new(),
            component_of: BTreeMap::new(),
            told_supers: BTreeMap::new(),
            closures: BTreeMap::new(),
            types: BTreeMap::new(),
            object_values: BTreeMap::new(),
            data_values: BTreeMap::new(),
            sub_properties: BTreeMap::new(),
            inverses: BTreeMap::new(),
            symmetric: BTreeSet::new(),
            transitive: BTreeSet::new(),
            disjoint: BTreeSet::new(),
        };

        let mut equivalences = Vec::new();
        for ontology in loaded.closure() {
            reasoner.classes.extend(ontology.classes().iter().cloned());
            for (sub, supers) in ontology.sub_class_axioms() {
                let entry = reasoner.told_supers.entry(sub.clone()).or_default();
                entry.extend(supers.iter().filter_map(ClassExpression::as_named).cloned());
            }
            equivalences.extend(ontology.equivalence_axioms().iter().cloned());
            reasoner
                .disjoint
                .extend(ontology.disjoint_axioms().iter().cloned());
            for (individual, classes) in ontology.class_assertions() {
                reasoner
                    .types
                    .entry(individual.clone())
                    .or_default()
                    .extend(classes.iter().cloned());
            }
            for (individual, properties) in ontology.object_assertions() {
                let entry = reasoner.object_values.entry(individual.clone()).or_default();
                for (property, objects) in properties {
                    entry
                        .entry(property.clone())
                        .or_default()
                        .extend(objects.iter().cloned());
                }
            }
            for (individual, properties) in ontology.data_assertions() {
                let entry = reasoner.data_values.entry(individual.clone()).or_default();
                for (property, values) in properties {
                    entry
                        .entry(property.clone())
                        .or_default()
                        .extend(values.iter().cloned());
                }
            }
            for (sub, supers) in ontology.sub_property_axioms() {
                for sup in supers {
                    reasoner
                        .sub_properties
                        .entry(sup.clone())
                        .or_default()
                        .insert(sub.clone());
                }
            }
            for (a, b) in ontology.inverse_axioms() {
                reasoner
                    .inverses
                    .entry(a.clone())
                    .or_default()
                    .insert(b.clone());
                reasoner
                    .inverses
                    .entry(b.clone())
                    .or_default()
                    .insert(a.clone());
            }
            reasoner
                .symmetric
                .extend(ontology.symmetric_properties().iter().cloned());
            reasoner
                .transitive
                .extend(ontology.transitive_properties().iter().cloned());
        }
        reasoner.partition(equivalences);
        reasoner.close_hierarchy();

        debug!(
            classes = reasoner.classes.len(),
            equivalence_sets = reasoner.components.len(),
            closures = reasoner.closures.len(),
            individuals = reasoner.types.len(),
            "structural reasoner ready"
        );
        reasoner
    }

    fn partition(&mut self, pairs: Vec<(ClassExpression, ClassExpression)>) {
        let mut adjacency: BTreeMap<ClassExpression, BTreeSet<ClassExpression>> = BTreeMap::new();
        for (a, b) in pairs {
            adjacency.entry(a.clone()).or_default().insert(b.clone());
            adjacency.entry(b).or_default().insert(a);
        }

        let mut visited = BTreeSet::new();
        for start in adjacency.keys() {
            if visited.contains(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start.clone()]);
            while let Some(current) = queue.pop_front() {
                if !visited.insert(current.clone()) {
                    continue;
                }
                if let Some(neighbours) = adjacency.get(&current) {
                    queue.extend(neighbours.iter().cloned());
                }
                component.insert(current);
            }
            let index = self.components.len();
            for member in &component {
                self.component_of.insert(member.clone(), index);
            }
            self.components.push(component);
        }
    }

    fn equivalents(&self, expression: &ClassExpression) -> BTreeSet<ClassExpression> {
        self.component_of
            .get(expression)
            .map(|index| self.components[*index].clone())
            .unwrap_or_else(|| BTreeSet::from([expression.clone()]))
    }

    fn named_equivalents(&self, class: &Iri) -> BTreeSet<Iri> {
        self.equivalents(&ClassExpression::Named(class.clone()))
            .into_iter()
            .filter_map(|expression| match expression {
                ClassExpression::Named(iri) => Some(iri),
                ClassExpression::Anonymous(_) => None,
            })
            .collect()
    }

    /// Caches the upward closure of every class mentioned by an axiom or a
    /// class assertion.
    fn close_hierarchy(&mut self) {
        let mut mentioned: BTreeSet<Iri> = self.classes.clone();
        for (sub, supers) in &self.told_supers {
            mentioned.insert(sub.clone());
            mentioned.extend(supers.iter().cloned());
        }
        mentioned.extend(self.types.values().flatten().cloned());
        mentioned.extend(
            self.components
                .iter()
                .flatten()
                .filter_map(ClassExpression::as_named)
                .cloned(),
        );

        let closures: BTreeMap<Iri, BTreeSet<Iri>> = mentioned
            .into_iter()
            .map(|class| {
                let closure = self.compute_closure(&class);
                (class, closure)
            })
            .collect();
        self.closures = closures;
    }

    fn compute_closure(&self, class: &Iri) -> BTreeSet<Iri> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([class.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let component = self
                .component_of
                .get(&ClassExpression::Named(current.clone()))
                .map(|index| &self.components[*index]);
            for equivalent in component.into_iter().flatten() {
                if let ClassExpression::Named(equivalent) = equivalent {
                    if !visited.contains(equivalent) {
                        queue.push_back(equivalent.clone());
                    }
                }
            }
            if let Some(supers) = self.told_supers.get(&current) {
                queue.extend(supers.iter().filter(|sup| !visited.contains(*sup)).cloned());
            }
        }
        visited
    }

    /// Every class reachable upwards from `class`, `class` included.
    fn upward_closure(&self, class: &Iri) -> Cow<'_, BTreeSet<Iri>> {
        match self.closures.get(class) {
            Some(closure) => Cow::Borrowed(closure),
            None => Cow::Owned(self.compute_closure(class)),
        }
    }

    /// Superclasses of `class` that are not also subclasses of it.
    fn strict_ancestors(&self, class: &Iri) -> BTreeSet<Iri> {
        self.upward_closure(class)
            .iter()
            .filter(|candidate| !self.upward_closure(candidate).contains(class))
            .cloned()
            .collect()
    }

    /// Most specific strict ancestors of `class`.
    ///
    /// Only told superclasses of the members of `class`'s own cycle can be
    /// direct; the rest of the closure is only used to widen the result to
    /// classes mutually subsumed by a direct one.
    fn direct_ancestors(&self, class: &Iri) -> BTreeSet<Iri> {
        let closure = self.upward_closure(class);
        let ancestors = self.strict_ancestors(class);
        let candidates: BTreeSet<Iri> = closure
            .iter()
            .filter(|member| !ancestors.contains(*member))
            .filter_map(|member| self.told_supers.get(member))
            .flatten()
            .filter(|sup| ancestors.contains(*sup))
            .cloned()
            .collect();
        let direct = self.most_specific(&candidates);
        ancestors
            .into_iter()
            .filter(|ancestor| {
                direct.contains(ancestor)
                    || direct.iter().any(|parent| {
                        self.upward_closure(parent).contains(ancestor)
                            && self.upward_closure(ancestor).contains(parent)
                    })
            })
            .collect()
    }

    /// Members of `classes` with no strict subclass inside `classes`.
    fn most_specific(&self, classes: &BTreeSet<Iri>) -> BTreeSet<Iri> {
        let implied: BTreeSet<Iri> = classes
            .iter()
            .flat_map(|class| self.strict_ancestors(class))
            .collect();
        classes.difference(&implied).cloned().collect()
    }

    fn known_class(&self, class: &Iri) -> Result<(), ReasonerError> {
        if self.classes.contains(class) || class.as_str() == vocab::OWL_THING {
            Ok(())
        } else {
            Err(ReasonerError::UnknownEntity(class.clone()))
        }
    }

    fn inferred_types(&self, individual: &Iri) -> BTreeSet<Iri> {
        self.types
            .get(individual)
            .into_iter()
            .flatten()
            .flat_map(|class| self.upward_closure(class).into_owned())
            .collect()
    }

    /// Property plus every property declared below it.
    fn property_closure(&self, property: &Iri) -> BTreeSet<Iri> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([property.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(subs) = self.sub_properties.get(&current) {
                queue.extend(subs.iter().cloned());
            }
        }
        visited
    }

    fn asserted_objects(&self, subject: &Iri, property: &Iri) -> impl Iterator<Item = &Iri> {
        self.object_values
            .get(subject)
            .and_then(|properties| properties.get(property))
            .into_iter()
            .flatten()
    }

    fn subjects_pointing_at<'a>(
        &'a self,
        object: &'a Iri,
        property: &'a Iri,
    ) -> impl Iterator<Item = &'a Iri> + 'a {
        self.object_values
            .iter()
            .filter(move |(_, properties)| {
                properties
                    .get(property)
                    .is_some_and(|objects| objects.contains(object))
            })
            .map(|(subject, _)| subject)
    }

    /// One hop of `property` from `individual`, without transitivity.
    fn step(&self, individual: &Iri, property: &Iri) -> BTreeSet<Iri> {
        let mut values = BTreeSet::new();
        for candidate in self.property_closure(property) {
            values.extend(self.asserted_objects(individual, &candidate).cloned());
            if self.symmetric.contains(&candidate) || self.symmetric.contains(property) {
                values.extend(self.subjects_pointing_at(individual, &candidate).cloned());
            }
            for inverse in self.inverses.get(&candidate).into_iter().flatten() {
                values.extend(self.subjects_pointing_at(individual, inverse).cloned());
            }
        }
        values
    }
}

impl Reasoner for StructuralReasoner {
    fn is_consistent(&self) -> Result<bool, ReasonerError> {
        for individual in self.types.keys() {
            let types = self.inferred_types(individual);
            if types.iter().any(|class| class.as_str() == vocab::OWL_NOTHING) {
                debug!(%individual, "individual is an instance of owl:Nothing");
                return Ok(false);
            }
            if let Some((a, b)) = self
                .disjoint
                .iter()
                .find(|(a, b)| types.contains(a) && types.contains(b))
            {
                debug!(%individual, %a, %b, "individual is an instance of disjoint classes");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn super_classes_of(&self, class: &Iri, direct: bool) -> Result<BTreeSet<Iri>, ReasonerError> {
        self.known_class(class)?;
        if direct {
            Ok(self.direct_ancestors(class))
        } else {
            Ok(self.strict_ancestors(class))
        }
    }

    fn equivalence_class_of(
        &self,
        class: &ClassExpression,
    ) -> Result<BTreeSet<ClassExpression>, ReasonerError> {
        if let ClassExpression::Named(iri) = class {
            self.known_class(iri)?;
        }
        Ok(self.equivalents(class))
    }

    fn instances_of(&self, class: &Iri, direct: bool) -> Result<BTreeSet<Iri>, ReasonerError> {
        self.known_class(class)?;
        let equivalents = self.named_equivalents(class);
        let instances = self
            .types
            .iter()
            .filter(|(individual, asserted)| {
                if direct {
                    self.most_specific(asserted)
                        .iter()
                        .any(|most_specific| equivalents.contains(most_specific))
                } else {
                    self.inferred_types(individual).contains(class)
                }
            })
            .map(|(individual, _)| individual.clone())
            .collect();
        Ok(instances)
    }

    fn object_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<Iri>, ReasonerError> {
        if !self.transitive.contains(property) {
            return Ok(self.step(individual, property));
        }

        let mut reached = BTreeSet::new();
        let mut queue: VecDeque<Iri> = self.step(individual, property).into_iter().collect();
        while let Some(current) = queue.pop_front() {
            if reached.insert(current.clone()) {
                queue.extend(self.step(&current, property));
            }
        }
        Ok(reached)
    }

    fn data_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<LiteralValue>, ReasonerError> {
        let Some(properties) = self.data_values.get(individual) else {
            return Ok(BTreeSet::new());
        };
        Ok(self
            .property_closure(property)
            .iter()
            .filter_map(|candidate| properties.get(candidate))
            .flatten()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::StructuralReasoner;
    use crate::ontology::{
        entities::{LoadedOntology, Ontology},
        reasoner::{Reasoner, ReasonerError},
        value_objects::{ClassExpression, Iri, LiteralValue},
        vocab,
    };

    fn iri(local: &str) -> Iri {
        Iri::new(format!("http://example.org/onto#{local}")).expect("valid iri")
    }

    fn named(local: &str) -> ClassExpression {
        ClassExpression::Named(iri(local))
    }

    fn hierarchy() -> Ontology {
        let mut ontology = Ontology::new(Iri::new("http://example.org/onto").expect("iri"));
        ontology.add_sub_class(iri("Cell"), named("Entity"));
        ontology.add_sub_class(iri("Neuron"), named("Cell"));
        ontology.add_sub_class(iri("Neuron"), named("Entity"));
        ontology.add_equivalence(named("NerveCell"), named("Neuron"));
        ontology.assert_type(iri("n1"), iri("Neuron"));
        ontology.assert_type(iri("n1"), iri("Cell"));
        ontology.assert_type(iri("c1"), iri("Cell"));
        ontology
    }

    fn reasoner(ontology: Ontology) -> StructuralReasoner {
        StructuralReasoner::new(&LoadedOntology::new(ontology))
    }

    #[test]
    fn direct_superclasses_drop_implied_parents() {
        let reasoner = reasoner(hierarchy());
        let direct = reasoner
            .super_classes_of(&iri("Neuron"), true)
            .expect("superclasses");
        assert_eq!(direct, BTreeSet::from([iri("Cell")]));

        let all = reasoner
            .super_classes_of(&iri("Neuron"), false)
            .expect("superclasses");
        assert_eq!(all, BTreeSet::from([iri("Cell"), iri("Entity")]));
    }

    #[test]
    fn deep_chains_answer_every_direct_query() {
        let mut ontology = Ontology::new(Iri::new("http://example.org/onto").expect("iri"));
        let depth = 300;
        for level in 1..depth {
            ontology.add_sub_class(iri(&format!("C{level}")), named(&format!("C{}", level - 1)));
        }
        let reasoner = reasoner(ontology);

        for level in 1..depth {
            let direct = reasoner
                .super_classes_of(&iri(&format!("C{level}")), true)
                .expect("superclasses");
            assert_eq!(direct, BTreeSet::from([iri(&format!("C{}", level - 1))]));
        }
        assert_eq!(
            reasoner
                .super_classes_of(&iri(&format!("C{}", depth - 1)), false)
                .expect("superclasses")
                .len(),
            depth - 1
        );
    }

    #[test]
    fn layered_hierarchy_keeps_only_nearest_parents() {
        let mut ontology = Ontology::new(Iri::new("http://example.org/onto").expect("iri"));
        let (levels, width) = (8, 40);
        for level in 1..levels {
            for index in 0..width {
                let class = iri(&format!("L{level}_{index}"));
                ontology.add_sub_class(class.clone(), named(&format!("L{}_{index}", level - 1)));
                ontology.add_sub_class(
                    class,
                    named(&format!("L{}_{}", level - 1, (index + 1) % width)),
                );
            }
        }
        // Redundant edge to a grandparent is not direct.
        ontology.add_sub_class(iri("L7_0"), named("L5_0"));
        let reasoner = reasoner(ontology);

        for index in 0..width {
            let direct = reasoner
                .super_classes_of(&iri(&format!("L7_{index}")), true)
                .expect("superclasses");
            assert_eq!(
                direct,
                BTreeSet::from([
                    iri(&format!("L6_{index}")),
                    iri(&format!("L6_{}", (index + 1) % width)),
                ])
            );
        }
    }

    #[test]
    fn mutually_subsumed_parents_are_both_direct() {
        let mut ontology = hierarchy();
        ontology.add_sub_class(iri("Soma"), named("Body"));
        ontology.add_sub_class(iri("Body"), named("Soma"));
        ontology.add_sub_class(iri("Perikaryon"), named("Soma"));
        let reasoner = reasoner(ontology);

        let direct = reasoner
            .super_classes_of(&iri("Perikaryon"), true)
            .expect("superclasses");
        assert_eq!(direct, BTreeSet::from([iri("Body"), iri("Soma")]));
    }

    #[test]
    fn top_level_classes_have_no_superclass() {
        let reasoner = reasoner(hierarchy());
        assert!(reasoner
            .super_classes_of(&iri("Entity"), true)
            .expect("superclasses")
            .is_empty());
    }

    #[test]
    fn equivalent_classes_share_superclasses() {
        let reasoner = reasoner(hierarchy());
        let direct = reasoner
            .super_classes_of(&iri("NerveCell"), true)
            .expect("superclasses");
        assert_eq!(direct, BTreeSet::from([iri("Cell")]));
    }

    #[test]
    fn equivalence_set_contains_the_queried_class() {
        let reasoner = reasoner(hierarchy());
        let set = reasoner
            .equivalence_class_of(&named("Neuron"))
            .expect("equivalents");
        assert_eq!(set, BTreeSet::from([named("NerveCell"), named("Neuron")]));
    }

    #[test]
    fn direct_instances_use_most_specific_type() {
        let reasoner = reasoner(hierarchy());
        let direct = reasoner.instances_of(&iri("Cell"), true).expect("instances");
        assert_eq!(direct, BTreeSet::from([iri("c1")]));

        let all = reasoner.instances_of(&iri("Cell"), false).expect("instances");
        assert_eq!(all, BTreeSet::from([iri("c1"), iri("n1")]));

        let via_equivalent = reasoner
            .instances_of(&iri("NerveCell"), true)
            .expect("instances");
        assert_eq!(via_equivalent, BTreeSet::from([iri("n1")]));
    }

    #[test]
    fn unknown_class_is_reported() {
        let reasoner = reasoner(hierarchy());
        let err = reasoner
            .super_classes_of(&iri("Missing"), true)
            .expect_err("unknown class");
        assert_eq!(err, ReasonerError::UnknownEntity(iri("Missing")));
    }

    #[test]
    fn disjoint_membership_is_inconsistent() {
        let mut ontology = hierarchy();
        ontology.add_disjoint(iri("Cell"), iri("Organism"));
        assert!(reasoner(ontology.clone()).is_consistent().expect("consistency"));

        ontology.assert_type(iri("n1"), iri("Organism"));
        assert!(!reasoner(ontology).is_consistent().expect("consistency"));
    }

    #[test]
    fn nothing_membership_is_inconsistent() {
        let mut ontology = hierarchy();
        ontology.add_sub_class(
            iri("Impossible"),
            ClassExpression::Named(Iri::new(vocab::OWL_NOTHING).expect("iri")),
        );
        ontology.assert_type(iri("x"), iri("Impossible"));
        assert!(!reasoner(ontology).is_consistent().expect("consistency"));
    }

    #[test]
    fn object_values_follow_inverse_symmetric_and_transitive_properties() {
        let mut ontology = hierarchy();
        ontology
            .assert_object_property(iri("a"), iri("partOf"), iri("b"))
            .expect("assertion");
        ontology
            .assert_object_property(iri("b"), iri("partOf"), iri("c"))
            .expect("assertion");
        ontology.add_inverse(iri("hasPart"), iri("partOf"));
        ontology
            .assert_object_property(iri("a"), iri("adjacentTo"), iri("d"))
            .expect("assertion");
        ontology.mark_symmetric(iri("adjacentTo"));

        let plain = reasoner(ontology.clone());
        assert_eq!(
            plain
                .object_property_values(&iri("a"), &iri("partOf"))
                .expect("values"),
            BTreeSet::from([iri("b")])
        );
        assert_eq!(
            plain
                .object_property_values(&iri("c"), &iri("hasPart"))
                .expect("values"),
            BTreeSet::from([iri("b")])
        );
        assert_eq!(
            plain
                .object_property_values(&iri("d"), &iri("adjacentTo"))
                .expect("values"),
            BTreeSet::from([iri("a")])
        );

        ontology.mark_transitive(iri("partOf"));
        let transitive = reasoner(ontology);
        assert_eq!(
            transitive
                .object_property_values(&iri("a"), &iri("partOf"))
                .expect("values"),
            BTreeSet::from([iri("b"), iri("c")])
        );
    }

    #[test]
    fn data_values_include_sub_properties() {
        let mut ontology = hierarchy();
        ontology
            .assert_data_property(iri("n1"), iri("nickname"), LiteralValue::simple("Ned"))
            .expect("assertion");
        ontology
            .assert_data_property(iri("n1"), iri("name"), LiteralValue::simple("Neuron one"))
            .expect("assertion");
        ontology.add_sub_property(iri("nickname"), iri("name"));

        let reasoner = reasoner(ontology);
        let values = reasoner
            .data_property_values(&iri("n1"), &iri("name"))
            .expect("values");
        assert_eq!(
            values,
            BTreeSet::from([
                LiteralValue::simple("Ned"),
                LiteralValue::simple("Neuron one"),
            ])
        );
    }
}
