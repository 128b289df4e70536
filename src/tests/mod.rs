#[cfg(test)]
mod support;


#[cfg(test)]
mod resolver_tests;
