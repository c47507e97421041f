/// Joins the non-empty components with `_` into a fully-qualified metric name.
///
/// An empty `name` always yields an empty string, whatever the namespace and
/// subsystem hold. Callers treat that as "no usable identity". Components are not
/// trimmed, so a whitespace-only namespace is kept as is.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut fq_name = String::with_capacity(namespace.len() + subsystem.len() + name.len() + 2);
    for component in [namespace, subsystem, name] {
        if component.is_empty() {
            continue;
        }
        if !fq_name.is_empty() {
            fq_name.push('_');
        }
        fq_name.push_str(component);
    }
    fq_name
}
